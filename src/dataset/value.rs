use arrow::{
    array::*,
    datatypes::{DataType, TimeUnit},
    error::ArrowError,
    util::display::array_value_to_string,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Number, Value};

/// Layout ClickHouse parses from JSON input for `DateTime` columns
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn type_err(expected: &'static str, array: &dyn Array) -> ArrowError {
    ArrowError::CastError(format!(
        "expected {expected}, got Arrow type {:?}",
        array.data_type()
    ))
}

macro_rules! primitive_cell {
    ($array:expr, $row:expr, $ty:ty) => {{
        let arr = $array
            .as_any()
            .downcast_ref::<$ty>()
            .ok_or_else(|| type_err(stringify!($ty), $array))?;
        Value::from(arr.value($row))
    }};
}

/// Encode one cell of an Arrow array as a JSON value for a JSONEachRow insert.
///
/// Booleans become `0`/`1` to fit `UInt8` columns, timestamps and dates are
/// rendered as `YYYY-MM-DD hh:mm:ss` in UTC and non-finite floats become
/// null. Types without a dedicated encoding fall back to Arrow's display
/// formatter.
pub fn arrow_cell_to_json(array: &dyn Array, row: usize) -> Result<Value, ArrowError> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match array.data_type() {
        DataType::Int8 => primitive_cell!(array, row, Int8Array),
        DataType::Int16 => primitive_cell!(array, row, Int16Array),
        DataType::Int32 => primitive_cell!(array, row, Int32Array),
        DataType::Int64 => primitive_cell!(array, row, Int64Array),
        DataType::UInt8 => primitive_cell!(array, row, UInt8Array),
        DataType::UInt16 => primitive_cell!(array, row, UInt16Array),
        DataType::UInt32 => primitive_cell!(array, row, UInt32Array),
        DataType::UInt64 => primitive_cell!(array, row, UInt64Array),
        DataType::Float32 => {
            let arr = array
                .as_any()
                .downcast_ref::<Float32Array>()
                .ok_or_else(|| type_err("Float32Array", array))?;
            float_to_json(f64::from(arr.value(row)))
        }
        DataType::Float64 => {
            let arr = array
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| type_err("Float64Array", array))?;
            float_to_json(arr.value(row))
        }
        DataType::Boolean => {
            let arr = array
                .as_any()
                .downcast_ref::<BooleanArray>()
                .ok_or_else(|| type_err("BooleanArray", array))?;
            Value::from(u8::from(arr.value(row)))
        }
        DataType::Utf8 => {
            let arr = array
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| type_err("StringArray", array))?;
            Value::from(arr.value(row))
        }
        DataType::LargeUtf8 => {
            let arr = array
                .as_any()
                .downcast_ref::<LargeStringArray>()
                .ok_or_else(|| type_err("LargeStringArray", array))?;
            Value::from(arr.value(row))
        }
        DataType::Timestamp(_, _) => {
            Value::from(timestamp_to_naive(array, row)?.format(DATETIME_FORMAT).to_string())
        }
        DataType::Date32 => {
            let arr = array
                .as_any()
                .downcast_ref::<Date32Array>()
                .ok_or_else(|| type_err("Date32Array", array))?;
            let days = arr.value(row);
            let date = NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
                .ok_or_else(|| out_of_range("Date32", i64::from(days)))?;
            Value::from(
                date.and_time(chrono::NaiveTime::MIN)
                    .format(DATETIME_FORMAT)
                    .to_string(),
            )
        }
        DataType::Date64 => {
            let arr = array
                .as_any()
                .downcast_ref::<Date64Array>()
                .ok_or_else(|| type_err("Date64Array", array))?;
            let millis = arr.value(row);
            let dt = DateTime::<Utc>::from_timestamp_millis(millis)
                .ok_or_else(|| out_of_range("Date64", millis))?;
            Value::from(dt.naive_utc().format(DATETIME_FORMAT).to_string())
        }
        _ => Value::from(array_value_to_string(array, row)?),
    };
    Ok(value)
}

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn float_to_json(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn out_of_range(what: &str, value: i64) -> ArrowError {
    ArrowError::ComputeError(format!("{what} value {value} out of range"))
}

fn timestamp_to_naive(array: &dyn Array, row: usize) -> Result<NaiveDateTime, ArrowError> {
    let dt = match array.data_type() {
        DataType::Timestamp(TimeUnit::Second, _) => {
            let arr = array
                .as_any()
                .downcast_ref::<TimestampSecondArray>()
                .ok_or_else(|| type_err("TimestampSecondArray", array))?;
            DateTime::<Utc>::from_timestamp(arr.value(row), 0)
                .ok_or_else(|| out_of_range("Timestamp seconds", arr.value(row)))?
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            let arr = array
                .as_any()
                .downcast_ref::<TimestampMillisecondArray>()
                .ok_or_else(|| type_err("TimestampMillisecondArray", array))?;
            DateTime::<Utc>::from_timestamp_millis(arr.value(row))
                .ok_or_else(|| out_of_range("Timestamp milliseconds", arr.value(row)))?
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            let arr = array
                .as_any()
                .downcast_ref::<TimestampMicrosecondArray>()
                .ok_or_else(|| type_err("TimestampMicrosecondArray", array))?;
            DateTime::<Utc>::from_timestamp_micros(arr.value(row))
                .ok_or_else(|| out_of_range("Timestamp microseconds", arr.value(row)))?
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            let arr = array
                .as_any()
                .downcast_ref::<TimestampNanosecondArray>()
                .ok_or_else(|| type_err("TimestampNanosecondArray", array))?;
            let nanos = arr.value(row);
            let secs = nanos.div_euclid(1_000_000_000);
            let nsec = nanos.rem_euclid(1_000_000_000) as u32;
            DateTime::<Utc>::from_timestamp(secs, nsec)
                .ok_or_else(|| out_of_range("Timestamp nanoseconds", nanos))?
        }
        _ => return Err(type_err("Timestamp array", array)),
    };
    Ok(dt.naive_utc())
}
