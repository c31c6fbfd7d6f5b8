use parquet_scaffold::store::{ClickHouseStore, ConnectOptions, StoreErr};
use std::{error::Error, fmt::Display};
use tracing::error;
use tracing_subscriber::{EnvFilter, prelude::*};

use crate::{ClickHouseArgs, Cli, Commands};

pub mod endpoints;
pub mod generate;
pub mod run;
pub mod table;

pub use endpoints::*;
pub use generate::*;
pub use run::*;
pub use table::*;

const DEFAULT_FILTER: &str = "parquet_scaffold=info,parquet_scaffold_codegen=info,parquet_scaffold_cli=info";

pub fn init_tracing(verbose: bool) {
    if verbose {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    } else {
        let filter_layer =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_level(false)
            .without_time();

        let _ = tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init();
    }
}

pub fn connect(args: &ClickHouseArgs) -> Result<ClickHouseStore, StoreErr> {
    let options = ConnectOptions::new(&args.clickhouse_url)?
        .database(args.clickhouse_database.clone())
        .credentials(args.clickhouse_user.clone(), args.clickhouse_password.clone());
    ClickHouseStore::connect(options)
}

/// Dispatch a parsed command line
pub async fn run_command(cli: Cli) -> Result<(), Box<dyn Error>> {
    let Cli {
        clickhouse,
        command,
        ..
    } = cli;
    match command {
        Commands::GenerateData {
            n_columns,
            n_rows,
            output,
            seed,
        } => run_generate_data(n_columns, n_rows, &output, seed)?,
        Commands::GenerateConfig {
            parquet_file,
            output,
            names,
        } => run_generate_config(&parquet_file, &output, names.into_defaults())?,
        Commands::WriteTable {
            config_file,
            parquet_file,
            drift,
        } => {
            let store = connect(&clickhouse)?;
            run_write_table(&store, &config_file, &parquet_file, drift.into()).await?
        }
        Commands::AppendEndpoints { config } => run_append_endpoints(&config),
        Commands::Run {
            parquet_dir,
            config_dir,
            reflect_config,
            skip_reflect,
            drift,
            names,
        } => {
            let store = match connect(&clickhouse) {
                Ok(store) => store,
                Err(e) => {
                    error!("Error: {e}");
                    return Ok(());
                }
            };
            let reflect_config = (!skip_reflect).then_some(reflect_config.as_path());
            run_batch(
                &store,
                &parquet_dir,
                &config_dir,
                reflect_config,
                names.into_defaults(),
                drift.into(),
            )
            .await;
        }
    }
    Ok(())
}

pub fn handle_error<E>(error: E)
where
    E: Display,
{
    eprintln!("{error}");
    ::std::process::exit(1);
}
