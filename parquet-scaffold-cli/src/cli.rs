use clap::{Args, Parser, Subcommand, ValueEnum};
use parquet_scaffold::{ConfigDefaults, DEFAULT_REFLECTOR_CONFIG, DriftPolicy};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Parquet to ClickHouse provisioning and Django REST scaffolding")]
pub struct Cli {
    #[arg(global = true, short = 'v', long, help = "Show debug messages")]
    pub verbose: bool,

    #[command(flatten)]
    pub clickhouse: ClickHouseArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ClickHouseArgs {
    #[arg(
        global = true,
        long,
        env = "CLICKHOUSE_URL",
        default_value = "http://localhost:8123",
        help = "ClickHouse HTTP interface URL"
    )]
    pub clickhouse_url: String,

    #[arg(global = true, long, env = "CLICKHOUSE_DATABASE", help = "ClickHouse database")]
    pub clickhouse_database: Option<String>,

    #[arg(global = true, long, env = "CLICKHOUSE_USER", help = "ClickHouse user")]
    pub clickhouse_user: Option<String>,

    #[arg(
        global = true,
        long,
        env = "CLICKHOUSE_PASSWORD",
        hide_env_values = true,
        help = "ClickHouse password"
    )]
    pub clickhouse_password: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Generate a synthetic stock-trading Parquet file")]
    GenerateData {
        #[arg(help = "Number of columns, between 3 and 60")]
        n_columns: usize,

        #[arg(help = "Number of rows")]
        n_rows: usize,

        #[arg(help = "Parquet file to write")]
        output: PathBuf,

        #[arg(long, help = "Seed for reproducible output")]
        seed: Option<u64>,
    },

    #[command(about = "Infer a table config from a Parquet file")]
    GenerateConfig {
        parquet_file: PathBuf,

        #[arg(help = "Config JSON file to write")]
        output: PathBuf,

        #[command(flatten)]
        names: NameArgs,
    },

    #[command(about = "Create the table of a config and load a Parquet file into it")]
    WriteTable {
        config_file: PathBuf,

        parquet_file: PathBuf,

        #[arg(long, value_enum, default_value_t = DriftArg::Warn, help = "What to do when an existing table differs from the config")]
        drift: DriftArg,
    },

    #[command(about = "Reflect the database with inspectdb and generate REST endpoints")]
    AppendEndpoints {
        #[arg(long, default_value = DEFAULT_REFLECTOR_CONFIG, help = "Reflector config JSON file")]
        config: PathBuf,
    },

    #[command(about = "Configure and load every Parquet file of a directory, then generate endpoints")]
    Run {
        parquet_dir: PathBuf,

        config_dir: PathBuf,

        #[arg(long, default_value = DEFAULT_REFLECTOR_CONFIG, help = "Reflector config JSON file")]
        reflect_config: PathBuf,

        #[arg(long, help = "Do not run inspectdb after loading")]
        skip_reflect: bool,

        #[arg(long, value_enum, default_value_t = DriftArg::Warn)]
        drift: DriftArg,

        #[command(flatten)]
        names: NameArgs,
    },
}

/// Overrides of the names a generated config does not derive from its file
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct NameArgs {
    #[arg(long, help = "Django app name [default: myapp]")]
    pub app_name: Option<String>,

    #[arg(long, help = "Django model name [default: ComplicatedModel]")]
    pub model_name: Option<String>,

    #[arg(long, help = "Serializer name [default: ComplicatedModelSerializer]")]
    pub serializer_name: Option<String>,

    #[arg(long, help = "View set name [default: ComplicatedModelViewSet]")]
    pub view_name: Option<String>,

    #[arg(long, help = "ClickHouse table engine [default: MergeTree]")]
    pub engine: Option<String>,

    #[arg(long, help = "ClickHouse ORDER BY key [default: id]")]
    pub order_by: Option<String>,
}

impl NameArgs {
    pub fn into_defaults(self) -> ConfigDefaults {
        let defaults = ConfigDefaults::default();
        ConfigDefaults {
            app_name: self.app_name.unwrap_or(defaults.app_name),
            model_name: self.model_name.unwrap_or(defaults.model_name),
            serializer_name: self.serializer_name.unwrap_or(defaults.serializer_name),
            view_name: self.view_name.unwrap_or(defaults.view_name),
            engine: self.engine.unwrap_or(defaults.engine),
            order_by: self.order_by.unwrap_or(defaults.order_by),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftArg {
    Warn,
    Fail,
}

impl From<DriftArg> for DriftPolicy {
    fn from(arg: DriftArg) -> Self {
        match arg {
            DriftArg::Warn => Self::Warn,
            DriftArg::Fail => Self::Fail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, error::ErrorKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_data() {
        let cli = Cli::try_parse_from(["parquet-scaffold", "generate-data", "10", "100", "out.parquet"])
            .unwrap();
        assert_eq!(
            cli.command,
            Commands::GenerateData {
                n_columns: 10,
                n_rows: 100,
                output: PathBuf::from("out.parquet"),
                seed: None,
            }
        );
    }

    #[test]
    fn test_generate_config_overrides() {
        let cli = Cli::try_parse_from([
            "parquet-scaffold",
            "generate-config",
            "Trades.parquet",
            "Trades_config.json",
            "--app-name",
            "market",
        ])
        .unwrap();
        let Commands::GenerateConfig { names, .. } = cli.command else {
            panic!("expected generate-config");
        };
        let defaults = names.into_defaults();
        assert_eq!(defaults.app_name, "market");
        assert_eq!(defaults.model_name, "ComplicatedModel");
    }

    #[test]
    fn test_write_table_drift() {
        let cli = Cli::try_parse_from([
            "parquet-scaffold",
            "write-table",
            "trades_config.json",
            "Trades.parquet",
            "--drift",
            "fail",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Commands::WriteTable {
                config_file: PathBuf::from("trades_config.json"),
                parquet_file: PathBuf::from("Trades.parquet"),
                drift: DriftArg::Fail,
            }
        );
        assert_eq!(DriftPolicy::from(DriftArg::Fail), DriftPolicy::Fail);
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["parquet-scaffold", "run", "data", "configs", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Run {
                reflect_config,
                skip_reflect,
                drift,
                ..
            } => {
                assert_eq!(reflect_config, PathBuf::from("config.json"));
                assert!(!skip_reflect);
                assert_eq!(drift, DriftArg::Warn);
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_argument_count() {
        let err = Cli::try_parse_from(["parquet-scaffold", "write-table", "only_config.json"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(err.use_stderr());

        let err = Cli::try_parse_from([
            "parquet-scaffold",
            "generate-config",
            "a.parquet",
            "a.json",
            "extra",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }
}
