use std::path::PathBuf;

use crate::store::StoreErr;

/// An error from any step of the scaffolding pipeline
#[derive(Debug, thiserror::Error)]
pub enum ScaffoldErr {
    /// A required file or directory does not exist
    #[error("'{}' not found", .0.display())]
    MissingFile(PathBuf),
    /// A configuration file lacks a required key
    #[error("Missing required configuration key: '{0}'")]
    MissingConfigKey(String),
    /// An external tool exited with a non-zero status
    #[error("{program} failed: {message}")]
    Subprocess {
        /// What was being run, e.g. `inspectdb`
        program: String,
        /// Captured diagnostic output of the tool
        message: String,
    },
    /// A column name cannot be used as a table identifier
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    /// An argument is outside its accepted range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A column declared in the table config is absent from the source file
    #[error("Column '{column}' declared for table '{table}' is missing from the source file")]
    MissingColumn {
        /// Target table
        table: String,
        /// Declared column
        column: String,
    },
    /// The existing table does not match the declared config
    #[error("Table '{table}' has drifted from its config: {diff}")]
    SchemaDrift {
        /// Target table
        table: String,
        /// Human readable summary of the differences
        diff: String,
    },
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Parquet Error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("Arrow Error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("Store Error: {0}")]
    Store(#[from] StoreErr),
    #[error("Codegen Error: {0}")]
    Codegen(#[from] parquet_scaffold_codegen::Error),
}

impl ScaffoldErr {
    pub(crate) fn reflection_failed<S: Into<String>>(message: S) -> Self {
        Self::Subprocess {
            program: "inspectdb".to_owned(),
            message: message.into(),
        }
    }
}

/// Shorthand for results of the scaffolding pipeline
pub type Result<T, E = ScaffoldErr> = std::result::Result<T, E>;
