use async_trait::async_trait;
use indexmap::IndexMap;
use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard, PoisonError},
};

use super::{ColumnStore, InsertBatch, Statement, StoreErr, TableColumn};

/// A call received by [`MockStore`]
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Execute(Statement),
    Describe(String),
    Insert(InsertBatch),
}

/// An in-memory column store that records every call it receives.
///
/// `CREATE TABLE IF NOT EXISTS` statements register the table (with the
/// columns in the statement) when it does not exist yet, so later describes
/// see it. Tables named with [`MockStore::fail_on`] reject every call.
#[derive(Debug, Default)]
pub struct MockStore {
    state: Mutex<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    tables: IndexMap<String, Vec<TableColumn>>,
    failing: HashSet<String>,
    log: Vec<MockCall>,
}

impl MockStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// Pretend the table already exists with the given columns
    pub fn with_table<S: Into<String>>(self, name: S, columns: Vec<TableColumn>) -> Self {
        self.lock().tables.insert(name.into(), columns);
        self
    }

    /// Every call touching the table fails with an execution error
    pub fn fail_on<S: Into<String>>(self, name: S) -> Self {
        self.lock().failing.insert(name.into());
        self
    }

    pub fn table(&self, name: &str) -> Option<Vec<TableColumn>> {
        self.lock().tables.get(name).cloned()
    }

    pub fn drain_log(&self) -> Vec<MockCall> {
        std::mem::take(&mut self.lock().log)
    }

    pub fn into_log(self) -> Vec<MockCall> {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .log
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MockState {
    fn check(&self, table: &str) -> Result<(), StoreErr> {
        if self.failing.contains(table) {
            Err(StoreErr::Exec(format!("table `{table}` is unavailable")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ColumnStore for MockStore {
    async fn execute(&self, stmt: Statement) -> Result<(), StoreErr> {
        let mut state = self.lock();
        state.log.push(MockCall::Execute(stmt.clone()));
        if let Some((name, columns)) = parse_create_table(&stmt.sql) {
            state.check(&name)?;
            state.tables.entry(name).or_insert(columns);
        }
        Ok(())
    }

    async fn describe_table(&self, table: &str) -> Result<Option<Vec<TableColumn>>, StoreErr> {
        let mut state = self.lock();
        state.log.push(MockCall::Describe(table.to_owned()));
        state.check(table)?;
        Ok(state.tables.get(table).cloned())
    }

    async fn insert(&self, batch: InsertBatch) -> Result<u64, StoreErr> {
        let mut state = self.lock();
        state.log.push(MockCall::Insert(batch.clone()));
        state.check(&batch.table)?;
        if !state.tables.contains_key(&batch.table) {
            return Err(StoreErr::Exec(format!(
                "Table `{}` doesn't exist",
                batch.table
            )));
        }
        Ok(batch.rows.len() as u64)
    }
}

/// Table name and columns of a ``CREATE TABLE IF NOT EXISTS `t` (`a` T, ...)`` statement
fn parse_create_table(sql: &str) -> Option<(String, Vec<TableColumn>)> {
    let rest = sql.strip_prefix("CREATE TABLE IF NOT EXISTS `")?;
    let (name, rest) = rest.split_once("` (")?;
    let (body, _) = rest.rsplit_once(") ENGINE")?;
    let columns = body
        .split(", `")
        .filter_map(|column| {
            let (name, column_type) = column.trim_start_matches('`').split_once("` ")?;
            Some(TableColumn::new(name, column_type))
        })
        .collect();
    Some((name.to_owned(), columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_create_table() {
        let sql = "CREATE TABLE IF NOT EXISTS `trades` (`dna_id` Int32, `price` Decimal(10, 2)) \
                   ENGINE = MergeTree ORDER BY id";
        assert_eq!(
            parse_create_table(sql),
            Some((
                "trades".to_owned(),
                vec![
                    TableColumn::new("dna_id", "Int32"),
                    TableColumn::new("price", "Decimal(10, 2)"),
                ]
            ))
        );
        assert_eq!(parse_create_table("DROP TABLE `trades`"), None);
    }
}
