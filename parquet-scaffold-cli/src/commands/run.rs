use parquet_scaffold::{
    BatchReport, ConfigBuilder, ConfigDefaults, DriftPolicy, Orchestrator, ReflectionOutcome,
    Reflector, ReflectorConfig, store::ColumnStore,
};
use std::path::Path;
use tracing::error;

/// Process a directory of Parquet files. Failures are logged, not returned;
/// the report is `None` only when the batch could not start.
pub async fn run_batch(
    store: &dyn ColumnStore,
    parquet_dir: &Path,
    config_dir: &Path,
    reflect_config: Option<&Path>,
    defaults: ConfigDefaults,
    policy: DriftPolicy,
) -> Option<BatchReport> {
    let mut reflector_err = None;
    let reflector = match reflect_config.map(ReflectorConfig::load) {
        Some(Ok(config)) => Some(Reflector::new(config)),
        Some(Err(e)) => {
            reflector_err = Some(e);
            None
        }
        None => None,
    };

    let orchestrator = Orchestrator::new(store)
        .config_builder(ConfigBuilder::new(defaults))
        .drift_policy(policy)
        .reflector(reflector);

    let report = match orchestrator.run(parquet_dir, config_dir).await {
        Ok(report) => Some(report),
        Err(e) => {
            error!("Error: {e}");
            None
        }
    };
    let reflection = report.as_ref().and_then(|r| r.reflection.as_ref());
    if let Some(ReflectionOutcome::Failed(e)) = reflection {
        error!("Error: {e}");
    }
    if let Some(e) = reflector_err {
        error!("Error: {e}");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use parquet_scaffold::{
        dataset::{DataGenerator, write_parquet},
        store::MockStore,
    };
    use std::fs;

    #[tokio::test]
    async fn test_missing_reflector_config_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let batch = DataGenerator::with_seed(3).generate(5, 4).unwrap();
        write_parquet(&batch, dir.path().join("Stocks.parquet")).unwrap();

        let store = MockStore::new();
        let report = run_batch(
            &store,
            dir.path(),
            &dir.path().join("configs"),
            Some(&dir.path().join("missing_config.json")),
            ConfigDefaults::default(),
            DriftPolicy::Warn,
        )
        .await
        .unwrap();

        assert_eq!(report.loaded().count(), 1);
        assert_eq!(report.reflection, None);
        assert!(store.table("stocks").is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_reflection_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let batch = DataGenerator::with_seed(3).generate(5, 4).unwrap();
        write_parquet(&batch, dir.path().join("Stocks.parquet")).unwrap();
        fs::create_dir_all(dir.path().join("site/api")).unwrap();
        let reflect_config = dir.path().join("config.json");
        fs::write(
            &reflect_config,
            format!(
                r#"{{"base_dir": {:?}, "project_dir": "site", "app_dir": "api", "database_alias": "", "python": "false"}}"#,
                dir.path().to_string_lossy()
            ),
        )
        .unwrap();

        let store = MockStore::new();
        let report = run_batch(
            &store,
            dir.path(),
            &dir.path().join("configs"),
            Some(&reflect_config),
            ConfigDefaults::default(),
            DriftPolicy::Warn,
        )
        .await
        .unwrap();

        assert_eq!(report.loaded().count(), 1);
        assert!(matches!(
            report.reflection,
            Some(ReflectionOutcome::Failed(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        let report = run_batch(
            &MockStore::new(),
            &dir.path().join("nowhere"),
            &dir.path().join("configs"),
            None,
            ConfigDefaults::default(),
            DriftPolicy::Warn,
        )
        .await;
        assert!(report.is_none());
    }
}
