use clap::Parser;
use dotenvy::dotenv;
use parquet_scaffold_cli::{Cli, handle_error, init_tracing, run_command};
use std::process::exit;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            exit(code);
        }
    };
    init_tracing(cli.verbose);

    run_command(cli).await.unwrap_or_else(handle_error);
}
