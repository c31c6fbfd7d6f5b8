use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{ColumnStore, InsertBatch, Statement, StoreErr, TableColumn};

const DESCRIBE_SQL: &str = "SELECT name, type FROM system.columns \
    WHERE database = currentDatabase() AND table = {table:String} \
    ORDER BY position FORMAT JSONEachRow";

/// Where and as whom to reach a ClickHouse server over its HTTP interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub url: Url,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl ConnectOptions {
    pub fn new(url: &str) -> Result<Self, StoreErr> {
        let url = Url::parse(url).map_err(|e| StoreErr::Conn(format!("{url}: {e}")))?;
        Ok(Self {
            url,
            database: None,
            user: None,
            password: None,
        })
    }

    pub fn database(mut self, database: Option<String>) -> Self {
        self.database = database;
        self
    }

    pub fn credentials(mut self, user: Option<String>, password: Option<String>) -> Self {
        self.user = user;
        self.password = password;
        self
    }
}

/// A ClickHouse server reached through `reqwest`
#[derive(Debug, Clone)]
pub struct ClickHouseStore {
    client: Client,
    options: ConnectOptions,
}

#[derive(Deserialize)]
struct SystemColumn {
    name: String,
    #[serde(rename = "type")]
    column_type: String,
}

impl ClickHouseStore {
    pub fn connect(options: ConnectOptions) -> Result<Self, StoreErr> {
        let client = Client::builder()
            .build()
            .map_err(|e| StoreErr::Conn(e.to_string()))?;
        Ok(Self { client, options })
    }

    fn request(&self, params: &[(&str, &str)], body: String) -> RequestBuilder {
        let mut req = self
            .client
            .post(self.options.url.clone())
            .query(params)
            .body(body);
        if let Some(database) = &self.options.database {
            req = req.query(&[("database", database)]);
        }
        if let Some(user) = &self.options.user {
            req = req.header("X-ClickHouse-User", user);
        }
        if let Some(password) = &self.options.password {
            req = req.header("X-ClickHouse-Key", password);
        }
        req
    }

    fn execute_request(&self, stmt: Statement) -> RequestBuilder {
        self.request(&[], stmt.sql)
    }

    fn describe_request(&self, table: &str) -> RequestBuilder {
        self.request(&[("param_table", table)], DESCRIBE_SQL.to_owned())
    }

    /// The statement travels in the `query` parameter, the rows in the body
    fn insert_request(&self, batch: &InsertBatch) -> Result<RequestBuilder, StoreErr> {
        let sql = batch.to_sql();
        debug!("{sql}");
        let body = batch.to_json_each_row()?;
        Ok(self.request(&[("query", sql.as_str())], body))
    }

    async fn send(&self, req: RequestBuilder) -> Result<String, StoreErr> {
        let resp = req
            .send()
            .await
            .map_err(|e| StoreErr::Conn(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| StoreErr::Query(e.to_string()))?;
        if status.is_success() {
            Ok(text)
        } else {
            Err(StoreErr::Exec(format!("{status}: {}", text.trim())))
        }
    }
}

#[async_trait]
impl ColumnStore for ClickHouseStore {
    async fn execute(&self, stmt: Statement) -> Result<(), StoreErr> {
        debug!("{stmt}");
        self.send(self.execute_request(stmt)).await?;
        Ok(())
    }

    async fn describe_table(&self, table: &str) -> Result<Option<Vec<TableColumn>>, StoreErr> {
        let body = self.send(self.describe_request(table)).await?;
        let columns = parse_system_columns(&body)?;
        Ok(if columns.is_empty() { None } else { Some(columns) })
    }

    async fn insert(&self, batch: InsertBatch) -> Result<u64, StoreErr> {
        self.send(self.insert_request(&batch)?).await?;
        Ok(batch.rows.len() as u64)
    }
}

fn parse_system_columns(body: &str) -> Result<Vec<TableColumn>, StoreErr> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str::<SystemColumn>(line)
                .map(|col| TableColumn::new(col.name, col.column_type))
                .map_err(|e| StoreErr::Query(format!("{e}: {line}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reqwest::Request;
    use serde_json::json;

    fn store(
        database: Option<&str>,
        user: Option<&str>,
        password: Option<&str>,
    ) -> ClickHouseStore {
        let options = ConnectOptions::new("http://localhost:8123")
            .unwrap()
            .database(database.map(str::to_owned))
            .credentials(user.map(str::to_owned), password.map(str::to_owned));
        ClickHouseStore::connect(options).unwrap()
    }

    fn query_pairs(req: &Request) -> Vec<(String, String)> {
        req.url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn body(req: &Request) -> &str {
        std::str::from_utf8(req.body().unwrap().as_bytes().unwrap()).unwrap()
    }

    #[test]
    fn test_execute_request() {
        let store = store(None, None, None);
        let ddl = "CREATE TABLE IF NOT EXISTS `t` (`dna_id` Int32) ENGINE = MergeTree ORDER BY dna_id";
        let req = store
            .execute_request(Statement::from_string(ddl))
            .build()
            .unwrap();

        assert_eq!(req.method(), reqwest::Method::POST);
        assert_eq!(req.url().as_str(), "http://localhost:8123/");
        assert!(query_pairs(&req).is_empty());
        assert_eq!(body(&req), ddl);
        assert!(req.headers().get("X-ClickHouse-User").is_none());
        assert!(req.headers().get("X-ClickHouse-Key").is_none());
    }

    #[test]
    fn test_describe_request() {
        let store = store(Some("analytics"), None, None);
        let req = store.describe_request("trades").build().unwrap();

        assert_eq!(
            query_pairs(&req),
            vec![
                ("param_table".to_owned(), "trades".to_owned()),
                ("database".to_owned(), "analytics".to_owned()),
            ]
        );
        assert_eq!(body(&req), DESCRIBE_SQL);
        assert!(body(&req).contains("table = {table:String}"));
        assert!(!body(&req).contains("trades"));
    }

    #[test]
    fn test_insert_request() {
        let store = store(Some("analytics"), Some("loader"), Some("secret"));
        let batch = InsertBatch {
            table: "trades".to_owned(),
            columns: vec!["dna_id".to_owned(), "name".to_owned()],
            rows: vec![
                vec![json!(1), json!("it's")],
                vec![json!(2), json!(null)],
            ],
        };
        let req = store.insert_request(&batch).unwrap().build().unwrap();

        assert_eq!(
            query_pairs(&req),
            vec![
                (
                    "query".to_owned(),
                    "INSERT INTO `trades` (`dna_id`, `name`) FORMAT JSONEachRow".to_owned()
                ),
                ("database".to_owned(), "analytics".to_owned()),
            ]
        );
        assert_eq!(
            body(&req),
            "{\"dna_id\":1,\"name\":\"it's\"}\n{\"dna_id\":2,\"name\":null}\n"
        );
        assert_eq!(req.headers()["X-ClickHouse-User"], "loader");
        assert_eq!(req.headers()["X-ClickHouse-Key"], "secret");
    }

    #[test]
    fn test_parse_system_columns() {
        let body = concat!(
            r#"{"name":"dna_id","type":"Int32"}"#,
            "\n",
            r#"{"name":"price","type":"Float32"}"#,
            "\n",
        );
        assert_eq!(
            parse_system_columns(body).unwrap(),
            vec![
                TableColumn::new("dna_id", "Int32"),
                TableColumn::new("price", "Float32"),
            ]
        );
        assert!(parse_system_columns("").unwrap().is_empty());
        assert!(matches!(
            parse_system_columns("not json"),
            Err(StoreErr::Query(_))
        ));
    }

    #[test]
    fn test_connect_options() {
        let options = ConnectOptions::new("http://localhost:8123")
            .unwrap()
            .database(Some("analytics".to_owned()))
            .credentials(Some("default".to_owned()), None);
        assert_eq!(options.url.as_str(), "http://localhost:8123/");
        assert_eq!(options.database.as_deref(), Some("analytics"));
        assert_eq!(options.password, None);

        assert!(matches!(
            ConnectOptions::new("not a url"),
            Err(StoreErr::Conn(_))
        ));
    }
}
