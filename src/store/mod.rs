//! Access to the column store that tables are provisioned in.

use async_trait::async_trait;
use indexmap::IndexMap;
use itertools::Itertools;
use serde_json::Value;
use std::fmt;

mod clickhouse;
#[cfg(feature = "mock")]
#[cfg_attr(docsrs, doc(cfg(feature = "mock")))]
mod mock;

pub use clickhouse::*;
#[cfg(feature = "mock")]
#[cfg_attr(docsrs, doc(cfg(feature = "mock")))]
pub use mock::*;

/// An error from unsuccessful column store operations
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
pub enum StoreErr {
    /// There was a problem reaching the store
    #[error("Connection Error: {0}")]
    Conn(String),
    /// A statement did not execute successfully
    #[error("Execution Error: {0}")]
    Exec(String),
    /// A query result could not be read
    #[error("Query Error: {0}")]
    Query(String),
}

/// A DDL or DML statement, complete with its literal SQL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
}

impl Statement {
    pub fn from_string<S: Into<String>>(sql: S) -> Self {
        Self { sql: sql.into() }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Rows to be inserted into one table in a single request.
///
/// The values travel separately from the SQL and are never spliced into it.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertBatch {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl InsertBatch {
    /// `INSERT INTO `t` (`a`, `b`) FORMAT JSONEachRow`
    pub fn to_sql(&self) -> String {
        format!(
            "INSERT INTO {} ({}) FORMAT JSONEachRow",
            quote_ident(&self.table),
            self.columns
                .iter()
                .map(|c| quote_ident(c))
                .join(", ")
        )
    }

    /// Rows as newline delimited JSON objects keyed by column name
    pub fn to_json_each_row(&self) -> Result<String, StoreErr> {
        let mut body = String::new();
        for row in &self.rows {
            let object: IndexMap<&str, &Value> = self
                .columns
                .iter()
                .map(String::as_str)
                .zip(row.iter())
                .collect();
            let line = serde_json::to_string(&object).map_err(|e| StoreErr::Exec(e.to_string()))?;
            body.push_str(&line);
            body.push('\n');
        }
        Ok(body)
    }
}

/// A column of an existing table as reported by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub name: String,
    pub column_type: String,
}

impl TableColumn {
    pub fn new<N, T>(name: N, column_type: T) -> Self
    where
        N: Into<String>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }
}

/// The operations table provisioning needs from a column store
#[async_trait]
pub trait ColumnStore: fmt::Debug + Send + Sync {
    /// Execute a statement that returns no rows
    async fn execute(&self, stmt: Statement) -> Result<(), StoreErr>;

    /// Columns of a table in declaration order, or `None` if it does not exist
    async fn describe_table(&self, table: &str) -> Result<Option<Vec<TableColumn>>, StoreErr>;

    /// Insert all rows of the batch, returning the number of rows sent
    async fn insert(&self, batch: InsertBatch) -> Result<u64, StoreErr>;
}

/// Quote an identifier with backticks, the only escaping applied to it
pub fn quote_ident(ident: &str) -> String {
    format!("`{ident}`")
}
