//! Reflecting a Django project's database through `inspectdb` and
//! scaffolding REST endpoints for every reflected model.

use parquet_scaffold_codegen::{
    ApiWriter, ReflectedModule, WriterOutput, extract_entity_names, upsert_models,
};
use serde_json::{Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};
use tracing::{debug, info};

use crate::{Result, ScaffoldErr};

pub const DEFAULT_REFLECTOR_CONFIG: &str = "config.json";
const DEFAULT_PYTHON: &str = "python";
const MODELS_FILE: &str = "models.py";

/// Where the Django project lives and which database to reflect
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReflectorConfig {
    pub base_dir: PathBuf,
    pub project_dir: String,
    pub app_dir: String,
    /// Empty for the default database
    pub database_alias: String,
    /// Interpreter used to run `manage.py`
    pub python: String,
}

impl ReflectorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let object: Map<String, Value> = serde_json::from_str(json)?;
        let required = |key: &str| -> Result<String> {
            match object.get(key) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(other) => Err(ScaffoldErr::InvalidArgument(format!(
                    "configuration key '{key}' must be a string, got {other}"
                ))),
                None => Err(ScaffoldErr::MissingConfigKey(key.to_owned())),
            }
        };

        Ok(Self {
            base_dir: PathBuf::from(required("base_dir")?),
            project_dir: required("project_dir")?,
            app_dir: required("app_dir")?,
            database_alias: required("database_alias")?,
            python: match object.get("python") {
                Some(_) => required("python")?,
                None => DEFAULT_PYTHON.to_owned(),
            },
        })
    }

    pub fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ScaffoldErr::MissingFile(path.to_owned()));
        }
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn project_path(&self) -> PathBuf {
        self.base_dir.join(&self.project_dir)
    }

    pub fn app_path(&self) -> PathBuf {
        self.project_path().join(&self.app_dir)
    }
}

/// Runs `inspectdb` and writes the models and REST scaffolding of its output
/// into the app directory
#[derive(Clone, Debug)]
pub struct Reflector {
    config: ReflectorConfig,
}

impl Reflector {
    pub fn new(config: ReflectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReflectorConfig {
        &self.config
    }

    /// Reflect the database and regenerate the app's endpoints. Returns the
    /// reflected entity names.
    pub fn run(&self) -> Result<Vec<String>> {
        let project_path = self.config.project_path();
        let app_path = self.config.app_path();
        for dir in [&project_path, &app_path] {
            if !dir.is_dir() {
                return Err(ScaffoldErr::MissingFile(dir.clone()));
            }
        }

        let output = self.run_inspectdb(&project_path)?;
        let entities = apply_reflection(&app_path, &output)?;
        info!("API endpoints generated successfully!");
        Ok(entities)
    }

    fn run_inspectdb(&self, project_path: &Path) -> Result<String> {
        let mut command = Command::new(&self.config.python);
        command
            .arg(project_path.join("manage.py"))
            .arg("inspectdb")
            .current_dir(project_path);
        if !self.config.database_alias.is_empty() {
            command.args(["--database", self.config.database_alias.as_str()]);
        }
        debug!("Running {command:?}");

        let output = command.output().map_err(|e| {
            ScaffoldErr::reflection_failed(format!("{}: {e}", self.config.python))
        })?;
        if !output.status.success() {
            return Err(ScaffoldErr::reflection_failed(
                String::from_utf8_lossy(&output.stderr).trim_end(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Upsert the reflected models into `models.py` and overwrite the
/// serializer, view and route modules of the app
pub fn apply_reflection(app_path: &Path, reflected: &str) -> Result<Vec<String>> {
    let entities = extract_entity_names(reflected);
    let writer = ApiWriter::new(entities.iter().cloned())?;

    let mut module = ReflectedModule::parse(reflected);
    let marked = module.mark_primary_keys();
    debug!("Marked {marked} synthetic id(s) as primary key");

    let models_path = app_path.join(MODELS_FILE);
    let existing = if models_path.is_file() {
        fs::read_to_string(&models_path)?
    } else {
        String::new()
    };
    fs::write(&models_path, upsert_models(&existing, &module))?;
    info!("Updating {}", models_path.display());

    let output: WriterOutput = writer.generate();
    output.write_to(app_path)?;
    Ok(writer.entities().to_vec())
}
