//! Batch processing of a directory of Parquet files: one config, one table
//! and one load per file, then a single reflection pass.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::{
    ConfigBuilder, DriftPolicy, ProvisionOutcome, Reflector, Result, ScaffoldErr,
    TableProvisioner, store::ColumnStore,
};

pub const PARQUET_EXTENSION: &str = "parquet";
const CONFIG_SUFFIX: &str = "_config.json";

/// Parquet files directly inside `dir`, sorted by file name
pub fn list_parquet_files<P>(dir: P) -> Result<Vec<PathBuf>>
where
    P: AsRef<Path>,
{
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(ScaffoldErr::MissingFile(dir.to_owned()));
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == PARQUET_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// `<config_dir>/<stem>_config.json`
pub fn config_path_for(source: &Path, config_dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    config_dir.join(format!("{stem}{CONFIG_SUFFIX}"))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadSummary {
    pub table: String,
    /// Whether the table was created by this run
    pub created: bool,
    pub rows: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileOutcome {
    Loaded(LoadSummary),
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileReport {
    pub file: PathBuf,
    pub config_path: PathBuf,
    pub outcome: FileOutcome,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReflectionOutcome {
    /// Entities scaffolded from the reflected models
    Generated(Vec<String>),
    Failed(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    /// `None` when no reflector was configured
    pub reflection: Option<ReflectionOutcome>,
}

impl BatchReport {
    pub fn loaded(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Loaded(_)))
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Failed(_)))
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s) loaded, {} failed",
            self.loaded().count(),
            self.failed().count()
        )
    }
}

/// Runs the whole pipeline over a directory of Parquet files
#[derive(Debug)]
pub struct Orchestrator<'a> {
    store: &'a dyn ColumnStore,
    builder: ConfigBuilder,
    policy: DriftPolicy,
    reflector: Option<Reflector>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(store: &'a dyn ColumnStore) -> Self {
        Self {
            store,
            builder: ConfigBuilder::default(),
            policy: DriftPolicy::default(),
            reflector: None,
        }
    }

    pub fn config_builder(mut self, builder: ConfigBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn drift_policy(mut self, policy: DriftPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reflect the database once all files are loaded
    pub fn reflector(mut self, reflector: Option<Reflector>) -> Self {
        self.reflector = reflector;
        self
    }

    /// Process every Parquet file of `parquet_dir`, writing configs into
    /// `config_dir`. A failing file is recorded and does not stop the batch,
    /// nor does a failing reflection pass.
    pub async fn run<P, Q>(&self, parquet_dir: P, config_dir: Q) -> Result<BatchReport>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let config_dir = config_dir.as_ref();
        let files = list_parquet_files(parquet_dir)?;
        fs::create_dir_all(config_dir)?;

        let mut report = BatchReport::default();
        for file in files {
            let config_path = config_path_for(&file, config_dir);
            let outcome = match self.process_file(&file, &config_path).await {
                Ok(summary) => FileOutcome::Loaded(summary),
                Err(err) => {
                    warn!("Skipping '{}': {err}", file.display());
                    FileOutcome::Failed(err.to_string())
                }
            };
            report.files.push(FileReport {
                file,
                config_path,
                outcome,
            });
        }

        info!("{report}");

        if let Some(reflector) = &self.reflector {
            info!("Reflecting the database after processing all files");
            report.reflection = Some(match reflector.run() {
                Ok(entities) => ReflectionOutcome::Generated(entities),
                Err(err) => ReflectionOutcome::Failed(err.to_string()),
            });
        }
        Ok(report)
    }

    async fn process_file(&self, file: &Path, config_path: &Path) -> Result<LoadSummary> {
        let name = file.file_name().unwrap_or_default().to_string_lossy();

        info!("Generating config for: {name}");
        let config = self.builder.build_from_parquet(file)?;
        config.write(config_path)?;

        info!("Writing table for: {name}");
        let provisioner = TableProvisioner::new(self.store).drift_policy(self.policy);
        let outcome = provisioner.provision(&config).await?;
        let rows = provisioner.bulk_load(&config, file).await?;

        Ok(LoadSummary {
            table: config.clickhouse_table.name,
            created: outcome == ProvisionOutcome::Created,
            rows,
        })
    }
}
