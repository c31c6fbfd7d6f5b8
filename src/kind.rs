use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// The observed kind of a source column, as far as table provisioning cares
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    DateTime,
    String,
    Other,
}

impl ColumnKind {
    /// Classify an Arrow data type.
    ///
    /// Dictionary-encoded columns are classified by their value type, which is
    /// how pyarrow writes categorical string columns.
    pub fn from_arrow(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => Self::Integer,
            DataType::Float16 | DataType::Float32 | DataType::Float64 => Self::Float,
            DataType::Boolean => Self::Boolean,
            DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64 => Self::DateTime,
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => Self::String,
            DataType::Dictionary(_, value) => Self::from_arrow(value),
            _ => Self::Other,
        }
    }

    /// Field declaration used in a generated Django model
    pub fn django_field(&self) -> &'static str {
        match self {
            Self::Integer => "models.IntegerField()",
            Self::Float => "models.FloatField()",
            Self::Boolean => "models.BooleanField()",
            Self::DateTime => "models.DateTimeField()",
            Self::String => "models.CharField(max_length=255)",
            Self::Other => "models.TextField()",
        }
    }

    /// ClickHouse column type
    pub fn clickhouse_type(&self) -> &'static str {
        match self {
            Self::Integer => "UInt32",
            Self::Float => "Float32",
            Self::Boolean => "UInt8",
            Self::DateTime => "DateTime",
            Self::String | Self::Other => "String",
        }
    }
}

/// A named column of a source file, in the order it was observed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnDescriptor {
    pub fn new<N: Into<String>>(name: N, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}
