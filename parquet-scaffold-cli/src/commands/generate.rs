use parquet_scaffold::{
    ConfigBuilder, ConfigDefaults, Result,
    dataset::{DataGenerator, write_parquet},
};
use std::path::Path;
use tracing::info;

pub fn run_generate_data(
    n_columns: usize,
    n_rows: usize,
    output: &Path,
    seed: Option<u64>,
) -> Result<()> {
    let mut generator = match seed {
        Some(seed) => DataGenerator::with_seed(seed),
        None => DataGenerator::new(),
    };
    let batch = generator.generate(n_columns, n_rows)?;
    write_parquet(&batch, output)?;
    info!("Parquet file generated: {}", output.display());
    Ok(())
}

pub fn run_generate_config(parquet_file: &Path, output: &Path, defaults: ConfigDefaults) -> Result<()> {
    let config = ConfigBuilder::new(defaults).build_from_parquet(parquet_file)?;
    config.write(output)
}
