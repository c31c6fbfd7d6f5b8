use parquet_scaffold::{DriftPolicy, Result, TableConfig, TableProvisioner, store::ColumnStore};
use std::path::Path;

/// Create the table of a config if needed, then load the Parquet file into it
pub async fn run_write_table(
    store: &dyn ColumnStore,
    config_file: &Path,
    parquet_file: &Path,
    policy: DriftPolicy,
) -> Result<()> {
    let config = TableConfig::read(config_file)?;
    let provisioner = TableProvisioner::new(store).drift_policy(policy);
    provisioner.provision(&config).await?;
    provisioner.bulk_load(&config, parquet_file).await?;
    Ok(())
}
