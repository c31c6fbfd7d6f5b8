//! Creating column-store tables from a [`TableConfig`] and loading Parquet
//! rows into them.

use arrow::{datatypes::Schema, record_batch::RecordBatch};
use itertools::Itertools;
use serde_json::Value;
use std::{fmt, path::Path};
use tracing::{debug, info, warn};

use crate::{
    Result, ScaffoldErr, TableConfig,
    dataset::{arrow_cell_to_json, read_batches},
    store::{ColumnStore, InsertBatch, Statement, TableColumn, quote_ident},
};

/// Synthetic sequential id prepended to every provisioned table
pub const SYNTHETIC_ID: &str = parquet_scaffold_codegen::SYNTHETIC_ID;
pub const SYNTHETIC_ID_TYPE: &str = "Int32";

/// What to do when an existing table does not match its config
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DriftPolicy {
    /// Log the differences and carry on loading
    #[default]
    Warn,
    /// Refuse to load into the table
    Fail,
}

/// Differences between the declared and the actual columns of a table
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    /// Declared but absent from the table
    pub missing: Vec<TableColumn>,
    /// Present in the table but not declared
    pub unexpected: Vec<TableColumn>,
    pub mismatched: Vec<ColumnMismatch>,
}

/// A column whose declared type differs from the one in the table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMismatch {
    pub name: String,
    pub declared: String,
    pub actual: String,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty() && self.mismatched.is_empty()
    }
}

impl fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = |cols: &[TableColumn]| {
            cols.iter()
                .map(|c| format!("{} {}", quote_ident(&c.name), c.column_type))
                .join(", ")
        };
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing {}", columns(&self.missing)));
        }
        if !self.unexpected.is_empty() {
            parts.push(format!("unexpected {}", columns(&self.unexpected)));
        }
        if !self.mismatched.is_empty() {
            let mismatched = self
                .mismatched
                .iter()
                .map(|m| {
                    format!(
                        "{} declared {} but is {}",
                        quote_ident(&m.name),
                        m.declared,
                        m.actual
                    )
                })
                .join(", ");
            parts.push(format!("mismatched {mismatched}"));
        }
        if parts.is_empty() {
            f.write_str("no differences")
        } else {
            f.write_str(&parts.join("; "))
        }
    }
}

/// The state a table was left in by [`TableProvisioner::provision`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created,
    /// The table already existed; drift, if any, was tolerated
    Existing(SchemaDiff),
}

/// Columns of the table a config declares, synthetic id first
pub fn declared_columns(config: &TableConfig) -> Vec<TableColumn> {
    std::iter::once(TableColumn::new(SYNTHETIC_ID, SYNTHETIC_ID_TYPE))
        .chain(
            config
                .clickhouse_table
                .fields
                .iter()
                .filter(|(name, _)| name.as_str() != SYNTHETIC_ID)
                .map(|(name, ty)| TableColumn::new(name.as_str(), ty.as_str())),
        )
        .collect()
}

/// ``CREATE TABLE IF NOT EXISTS `t` (`dna_id` Int32, ...) ENGINE = E ORDER BY K``
pub fn create_table_statement(config: &TableConfig) -> Statement {
    let table = &config.clickhouse_table;
    let columns = declared_columns(config)
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.column_type))
        .join(", ");
    Statement::from_string(format!(
        "CREATE TABLE IF NOT EXISTS {} ({columns}) ENGINE = {} ORDER BY {}",
        quote_ident(&table.name),
        table.engine,
        table.order_by
    ))
}

/// Diff the declared columns against what the store reports
pub fn diff_columns(declared: &[TableColumn], actual: &[TableColumn]) -> SchemaDiff {
    let mut diff = SchemaDiff::default();
    for column in declared {
        match actual.iter().find(|a| a.name == column.name) {
            None => diff.missing.push(column.clone()),
            Some(found) if found.column_type != column.column_type => {
                diff.mismatched.push(ColumnMismatch {
                    name: column.name.clone(),
                    declared: column.column_type.clone(),
                    actual: found.column_type.clone(),
                })
            }
            Some(_) => {}
        }
    }
    diff.unexpected = actual
        .iter()
        .filter(|a| !declared.iter().any(|d| d.name == a.name))
        .cloned()
        .collect();
    diff
}

/// Collect the declared columns of every batch into one insert, numbering
/// rows `1..=N` in file order.
pub fn build_insert_batch(
    config: &TableConfig,
    schema: &Schema,
    batches: &[RecordBatch],
) -> Result<InsertBatch> {
    let table = &config.clickhouse_table.name;
    let columns: Vec<String> = declared_columns(config)
        .into_iter()
        .map(|c| c.name)
        .collect();

    let indices = columns[1..]
        .iter()
        .map(|name| {
            schema
                .index_of(name)
                .map_err(|_| ScaffoldErr::MissingColumn {
                    table: table.clone(),
                    column: name.clone(),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let total: usize = batches.iter().map(RecordBatch::num_rows).sum();
    if i32::try_from(total).is_err() {
        return Err(ScaffoldErr::InvalidArgument(format!(
            "{total} rows do not fit the {SYNTHETIC_ID_TYPE} {SYNTHETIC_ID} column"
        )));
    }

    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(total);
    for batch in batches {
        for row in 0..batch.num_rows() {
            let mut values = Vec::with_capacity(columns.len());
            values.push(Value::from(rows.len() as i32 + 1));
            for &index in &indices {
                values.push(arrow_cell_to_json(batch.column(index).as_ref(), row)?);
            }
            rows.push(values);
        }
    }

    Ok(InsertBatch {
        table: table.clone(),
        columns,
        rows,
    })
}

/// Creates, checks and fills the tables described by table configs
#[derive(Debug)]
pub struct TableProvisioner<'a> {
    store: &'a dyn ColumnStore,
    policy: DriftPolicy,
}

impl<'a> TableProvisioner<'a> {
    pub fn new(store: &'a dyn ColumnStore) -> Self {
        Self {
            store,
            policy: DriftPolicy::default(),
        }
    }

    pub fn drift_policy(mut self, policy: DriftPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Issue the create statement. A no-op if the table exists.
    pub async fn create_table_if_absent(&self, config: &TableConfig) -> Result<()> {
        let stmt = create_table_statement(config);
        debug!("{stmt}");
        self.store.execute(stmt).await?;
        info!(
            "ClickHouse table '{}' created successfully.",
            config.clickhouse_table.name
        );
        Ok(())
    }

    /// Compare an existing table against its config.
    ///
    /// A table that does not exist reports every declared column as missing.
    pub async fn reconcile(&self, config: &TableConfig) -> Result<SchemaDiff> {
        let declared = declared_columns(config);
        let actual = self
            .store
            .describe_table(&config.clickhouse_table.name)
            .await?
            .unwrap_or_default();
        Ok(diff_columns(&declared, &actual))
    }

    /// Create the table if it is absent, otherwise reconcile it under the
    /// drift policy
    pub async fn provision(&self, config: &TableConfig) -> Result<ProvisionOutcome> {
        let table = &config.clickhouse_table.name;
        let Some(actual) = self.store.describe_table(table).await? else {
            self.create_table_if_absent(config).await?;
            return Ok(ProvisionOutcome::Created);
        };

        let diff = diff_columns(&declared_columns(config), &actual);
        if !diff.is_empty() {
            match self.policy {
                DriftPolicy::Warn => warn!("Table '{table}' differs from its config: {diff}"),
                DriftPolicy::Fail => {
                    return Err(ScaffoldErr::SchemaDrift {
                        table: table.clone(),
                        diff: diff.to_string(),
                    });
                }
            }
        }
        Ok(ProvisionOutcome::Existing(diff))
    }

    /// Insert every row of a Parquet file, returning the number of rows sent
    pub async fn bulk_load<P>(&self, config: &TableConfig, source: P) -> Result<u64>
    where
        P: AsRef<Path>,
    {
        let source = source.as_ref();
        let (schema, batches) = read_batches(source)?;
        let batch = build_insert_batch(config, &schema, &batches)?;
        let table = &config.clickhouse_table.name;
        if batch.rows.is_empty() {
            info!("'{}' has no rows to insert into '{table}'", source.display());
            return Ok(0);
        }
        let rows = self.store.insert(batch).await?;
        info!(
            "Data from Parquet file '{}' inserted into '{table}' ({rows} rows).",
            source.display()
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnDescriptor, ColumnKind, ConfigBuilder};
    use arrow::{
        array::{ArrayRef, Float64Array, StringArray},
        datatypes::{DataType, Field},
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn trades() -> TableConfig {
        ConfigBuilder::default()
            .build(
                "Trades.parquet",
                &[
                    ColumnDescriptor::new("price", ColumnKind::Float),
                    ColumnDescriptor::new("name", ColumnKind::String),
                ],
            )
            .unwrap()
    }

    fn trade_batch(prices: Vec<f64>, names: Vec<&str>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("name", DataType::Utf8, false),
            Field::new("price", DataType::Float64, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(names)),
            Arc::new(Float64Array::from(prices)),
        ];
        RecordBatch::try_new(schema, columns).unwrap()
    }

    #[test]
    fn test_create_table_statement() {
        assert_eq!(
            create_table_statement(&trades()).sql,
            "CREATE TABLE IF NOT EXISTS `trades` (`dna_id` Int32, `price` Float32, `name` String) \
             ENGINE = MergeTree ORDER BY id"
        );
    }

    #[test]
    fn test_synthetic_id_not_repeated() {
        let mut config = trades();
        config
            .clickhouse_table
            .fields
            .insert("dna_id".to_owned(), "Int64".to_owned());
        assert_eq!(
            declared_columns(&config),
            vec![
                TableColumn::new("dna_id", "Int32"),
                TableColumn::new("price", "Float32"),
                TableColumn::new("name", "String"),
            ]
        );
    }

    #[test]
    fn test_build_insert_batch() {
        let first = trade_batch(vec![12.5, 99.0], vec!["AAPL", "MSFT"]);
        let second = trade_batch(vec![7.25], vec!["NVDA"]);
        let batch =
            build_insert_batch(&trades(), &first.schema(), &[first.clone(), second]).unwrap();

        assert_eq!(batch.columns, vec!["dna_id", "price", "name"]);
        assert_eq!(
            batch.rows,
            vec![
                vec![Value::from(1), Value::from(12.5), Value::from("AAPL")],
                vec![Value::from(2), Value::from(99.0), Value::from("MSFT")],
                vec![Value::from(3), Value::from(7.25), Value::from("NVDA")],
            ]
        );
    }

    #[test]
    fn test_missing_column() {
        let mut config = trades();
        config
            .clickhouse_table
            .fields
            .insert("volume".to_owned(), "UInt32".to_owned());
        let batch = trade_batch(vec![1.0], vec!["AAPL"]);

        assert!(matches!(
            build_insert_batch(&config, &batch.schema(), &[batch.clone()]),
            Err(ScaffoldErr::MissingColumn { table, column }) if table == "trades" && column == "volume"
        ));
    }

    #[test]
    fn test_diff_columns() {
        let declared = declared_columns(&trades());
        let actual = vec![
            TableColumn::new("dna_id", "Int32"),
            TableColumn::new("price", "Float64"),
            TableColumn::new("volume", "UInt32"),
        ];
        let diff = diff_columns(&declared, &actual);

        assert_eq!(diff.missing, vec![TableColumn::new("name", "String")]);
        assert_eq!(diff.unexpected, vec![TableColumn::new("volume", "UInt32")]);
        assert_eq!(
            diff.mismatched,
            vec![ColumnMismatch {
                name: "price".to_owned(),
                declared: "Float32".to_owned(),
                actual: "Float64".to_owned(),
            }]
        );
        assert_eq!(
            diff.to_string(),
            "missing `name` String; unexpected `volume` UInt32; \
             mismatched `price` declared Float32 but is Float64"
        );
        assert!(diff_columns(&declared, &declared).is_empty());
    }
}
