#![allow(dead_code)]

use arrow::{
    array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray},
    datatypes::{DataType, Field, Schema, TimeUnit},
    record_batch::RecordBatch,
};
use parquet_scaffold::dataset::write_parquet;
use std::{path::Path, path::PathBuf, sync::Arc};

/// `price` and `name` for three trades
pub fn trades_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("price", DataType::Float64, true),
        Field::new("name", DataType::Utf8, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from(vec![Some(12.5), None, Some(7.25)])),
        Arc::new(StringArray::from(vec![Some("AAPL"), Some("MSFT"), None])),
    ];
    RecordBatch::try_new(schema, columns).unwrap()
}

/// One column of every kind the config builder distinguishes
pub fn mixed_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("traded_at", DataType::Timestamp(TimeUnit::Microsecond, None), false),
        Field::new("active", DataType::Boolean, false),
        Field::new("ratio", DataType::Float64, false),
        Field::new("ticker", DataType::Utf8, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vec![1, 2])),
        // 2025-01-01 09:15:00 and 09:30:00
        Arc::new(TimestampMicrosecondArray::from(vec![
            1_735_722_900_000_000,
            1_735_723_800_000_000,
        ])),
        Arc::new(BooleanArray::from(vec![true, false])),
        Arc::new(Float64Array::from(vec![0.5, 1.5])),
        Arc::new(StringArray::from(vec!["SPY", "SPX"])),
    ];
    RecordBatch::try_new(schema, columns).unwrap()
}

pub fn write_batch(dir: &Path, file_name: &str, batch: &RecordBatch) -> PathBuf {
    let path = dir.join(file_name);
    write_parquet(batch, &path).unwrap();
    path
}
