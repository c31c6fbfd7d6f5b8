//! The declarative table config that bridges schema inference, table
//! provisioning and code generation.
//!
//! A config is built once per source file and persisted as JSON:
//!
//! ```json
//! {
//!     "app_name": "myapp",
//!     "model_name": "ComplicatedModel",
//!     "model_fields": {
//!         "price": "models.FloatField()"
//!     },
//!     "serializer_name": "ComplicatedModelSerializer",
//!     "view_name": "ComplicatedModelViewSet",
//!     "url_path": "Trades",
//!     "clickhouse_table": {
//!         "name": "trades",
//!         "engine": "MergeTree",
//!         "order_by": "id",
//!         "fields": {
//!             "price": "Float32"
//!         }
//!     }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::info;

use crate::{ColumnDescriptor, Result, ScaffoldErr, dataset::read_descriptors};

/// Column name to type declaration, in source column order
pub type FieldMap = IndexMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub app_name: String,
    pub model_name: String,
    pub model_fields: FieldMap,
    pub serializer_name: String,
    pub view_name: String,
    pub url_path: String,
    pub clickhouse_table: ClickHouseTable,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickHouseTable {
    pub name: String,
    pub engine: String,
    pub order_by: String,
    pub fields: FieldMap,
}

/// Names that are not derived from the source file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigDefaults {
    pub app_name: String,
    pub model_name: String,
    pub serializer_name: String,
    pub view_name: String,
    pub engine: String,
    pub order_by: String,
}

impl Default for ConfigDefaults {
    fn default() -> Self {
        Self {
            app_name: "myapp".to_owned(),
            model_name: "ComplicatedModel".to_owned(),
            serializer_name: "ComplicatedModelSerializer".to_owned(),
            view_name: "ComplicatedModelViewSet".to_owned(),
            engine: "MergeTree".to_owned(),
            order_by: "id".to_owned(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigBuilder {
    defaults: ConfigDefaults,
}

impl ConfigBuilder {
    pub fn new(defaults: ConfigDefaults) -> Self {
        Self { defaults }
    }

    /// Build the config of a source file from its column descriptors
    pub fn build<P>(&self, source: P, columns: &[ColumnDescriptor]) -> Result<TableConfig>
    where
        P: AsRef<Path>,
    {
        let endpoint = file_stem(source.as_ref())?;
        let table_name = endpoint.to_lowercase();
        validate_identifier(&table_name)?;

        let mut model_fields = FieldMap::with_capacity(columns.len());
        let mut fields = FieldMap::with_capacity(columns.len());
        for column in columns {
            validate_identifier(&column.name)?;
            model_fields.insert(column.name.clone(), column.kind.django_field().to_owned());
            fields.insert(column.name.clone(), column.kind.clickhouse_type().to_owned());
        }

        let ConfigDefaults {
            app_name,
            model_name,
            serializer_name,
            view_name,
            engine,
            order_by,
        } = self.defaults.clone();

        Ok(TableConfig {
            app_name,
            model_name,
            model_fields,
            serializer_name,
            view_name,
            url_path: endpoint.clone(),
            clickhouse_table: ClickHouseTable {
                name: table_name,
                engine,
                order_by,
                fields,
            },
        })
    }

    /// Infer column descriptors from a Parquet file, then build its config
    pub fn build_from_parquet<P>(&self, source: P) -> Result<TableConfig>
    where
        P: AsRef<Path>,
    {
        let source = source.as_ref();
        let columns = read_descriptors(source)?;
        self.build(source, &columns)
    }
}

impl TableConfig {
    /// Render as JSON with 4-space indentation
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        // serde_json only ever emits UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        validate_identifier(&config.clickhouse_table.name)?;
        for name in config
            .model_fields
            .keys()
            .chain(config.clickhouse_table.fields.keys())
        {
            validate_identifier(name)?;
        }
        Ok(config)
    }

    pub fn write<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        info!("Configuration file generated: {}", path.display());
        Ok(())
    }

    pub fn read<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ScaffoldErr::MissingFile(path.to_owned()));
        }
        Self::from_json(&fs::read_to_string(path)?)
    }
}

/// A table or column name has to survive backtick quoting in ClickHouse DDL
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('`') || name.chars().any(char::is_control) {
        return Err(ScaffoldErr::InvalidIdentifier(name.to_owned()));
    }
    Ok(())
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| ScaffoldErr::InvalidArgument(format!("no file name in {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColumnKind;
    use pretty_assertions::assert_eq;

    fn trade_columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("price", ColumnKind::Float),
            ColumnDescriptor::new("name", ColumnKind::String),
        ]
    }

    #[test]
    fn test_build_trades() {
        let config = ConfigBuilder::default()
            .build("/data/Trades.parquet", &trade_columns())
            .unwrap();

        assert_eq!(config.clickhouse_table.name, "trades");
        assert_eq!(config.url_path, "Trades");
        assert_eq!(
            config.model_fields.into_iter().collect::<Vec<_>>(),
            vec![
                ("price".to_owned(), "models.FloatField()".to_owned()),
                ("name".to_owned(), "models.CharField(max_length=255)".to_owned()),
            ]
        );
        assert_eq!(
            config.clickhouse_table.fields.into_iter().collect::<Vec<_>>(),
            vec![
                ("price".to_owned(), "Float32".to_owned()),
                ("name".to_owned(), "String".to_owned()),
            ]
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = ConfigBuilder::default();
        let a = builder.build("Trades.parquet", &trade_columns()).unwrap();
        let b = builder.build("Trades.parquet", &trade_columns()).unwrap();
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }

    #[test]
    fn test_json_layout() {
        let config = ConfigBuilder::default()
            .build("Trades.parquet", &trade_columns()[..1])
            .unwrap();

        assert_eq!(
            config.to_json().unwrap(),
            [
                r#"{"#,
                r#"    "app_name": "myapp","#,
                r#"    "model_name": "ComplicatedModel","#,
                r#"    "model_fields": {"#,
                r#"        "price": "models.FloatField()""#,
                r#"    },"#,
                r#"    "serializer_name": "ComplicatedModelSerializer","#,
                r#"    "view_name": "ComplicatedModelViewSet","#,
                r#"    "url_path": "Trades","#,
                r#"    "clickhouse_table": {"#,
                r#"        "name": "trades","#,
                r#"        "engine": "MergeTree","#,
                r#"        "order_by": "id","#,
                r#"        "fields": {"#,
                r#"            "price": "Float32""#,
                r#"        }"#,
                r#"    }"#,
                r#"}"#,
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_json_keeps_field_order() {
        let columns: Vec<_> = ["zeta", "alpha", "mid"]
            .into_iter()
            .map(|name| ColumnDescriptor::new(name, ColumnKind::Integer))
            .collect();
        let config = ConfigBuilder::default().build("x.parquet", &columns).unwrap();
        let parsed = TableConfig::from_json(&config.to_json().unwrap()).unwrap();

        assert_eq!(
            parsed.clickhouse_table.fields.keys().collect::<Vec<_>>(),
            vec!["zeta", "alpha", "mid"]
        );
    }

    #[test]
    fn test_overridden_defaults() {
        let builder = ConfigBuilder::new(ConfigDefaults {
            app_name: "market".to_owned(),
            order_by: "dna_id".to_owned(),
            ..Default::default()
        });
        let config = builder.build("Quotes.parquet", &trade_columns()).unwrap();
        assert_eq!(config.app_name, "market");
        assert_eq!(config.model_name, "ComplicatedModel");
        assert_eq!(config.clickhouse_table.order_by, "dna_id");
    }

    #[test]
    fn test_invalid_identifier() {
        let columns = vec![ColumnDescriptor::new("bad`name", ColumnKind::String)];
        assert!(matches!(
            ConfigBuilder::default().build("t.parquet", &columns),
            Err(ScaffoldErr::InvalidIdentifier(name)) if name == "bad`name"
        ));
    }

    #[test]
    fn test_invalid_table_name() {
        assert!(matches!(
            ConfigBuilder::default().build("/data/we`ird.parquet", &trade_columns()),
            Err(ScaffoldErr::InvalidIdentifier(name)) if name == "we`ird"
        ));

        let json = ConfigBuilder::default()
            .build("Trades.parquet", &trade_columns())
            .unwrap()
            .to_json()
            .unwrap()
            .replace(r#""name": "trades""#, r#""name": "trades` (x Int8) ENGINE = Log --""#);
        assert!(matches!(
            TableConfig::from_json(&json),
            Err(ScaffoldErr::InvalidIdentifier(name)) if name.starts_with("trades`")
        ));
    }

    #[test]
    fn test_read_missing_file() {
        assert!(matches!(
            TableConfig::read("/nonexistent/trades_config.json"),
            Err(ScaffoldErr::MissingFile(_))
        ));
    }
}
