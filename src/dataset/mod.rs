//! Reading and writing Parquet files through Arrow record batches.

use arrow::{
    datatypes::SchemaRef,
    record_batch::{RecordBatch, RecordBatchReader},
};
use parquet::{
    arrow::{ArrowWriter, arrow_reader::ParquetRecordBatchReaderBuilder},
    basic::Compression,
    file::properties::WriterProperties,
};
use std::{fs::File, path::Path};
use tracing::debug;

use crate::{ColumnDescriptor, ColumnKind, Result, ScaffoldErr};

mod generate;
mod value;

pub use generate::*;
pub use value::*;

fn open(path: &Path) -> Result<ParquetRecordBatchReaderBuilder<File>> {
    if !path.is_file() {
        return Err(ScaffoldErr::MissingFile(path.to_owned()));
    }
    let file = File::open(path)?;
    Ok(ParquetRecordBatchReaderBuilder::try_new(file)?)
}

/// Observe the column names and kinds of a Parquet file, in schema order.
/// Only the footer is read.
pub fn read_descriptors<P>(path: P) -> Result<Vec<ColumnDescriptor>>
where
    P: AsRef<Path>,
{
    let builder = open(path.as_ref())?;
    Ok(builder
        .schema()
        .fields()
        .iter()
        .map(|field| ColumnDescriptor::new(field.name(), ColumnKind::from_arrow(field.data_type())))
        .collect())
}

/// Read every row group of a Parquet file, along with the file's schema
pub fn read_batches<P>(path: P) -> Result<(SchemaRef, Vec<RecordBatch>)>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let reader = open(path)?.build()?;
    let schema = reader.schema();
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    debug!(
        "Read {} batch(es) from {}",
        batches.len(),
        path.display()
    );
    Ok((schema, batches))
}

/// Write a single record batch as a Snappy compressed Parquet file
pub fn write_parquet<P>(batch: &RecordBatch, path: P) -> Result<()>
where
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}
