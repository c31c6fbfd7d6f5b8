use arrow::{
    array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray},
    datatypes::{DataType, Field, Schema, TimeUnit},
    record_batch::RecordBatch,
};
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use std::sync::Arc;
use tracing::debug;

use crate::{Result, ScaffoldErr};

/// Column names of a synthetic stock-trading table, in generation order.
/// The first three are always `id`, `business_date` and `ticker`.
pub const STOCK_COLUMNS: &[&str] = &[
    "id",
    "business_date",
    "ticker",
    "open_price",
    "close_price",
    "high",
    "low",
    "volume",
    "market_cap",
    "pe_ratio",
    "dividend_yield",
    "moving_average",
    "macd",
    "rsi",
    "beta",
    "price_to_book",
    "price_to_sales",
    "eps",
    "average_daily_volume",
    "52_week_high",
    "52_week_low",
    "previous_close",
    "market_trend",
    "industry",
    "sector",
    "exchange",
    "currency",
    "current_ratio",
    "quick_ratio",
    "debt_to_equity",
    "price_to_earnings_growth",
    "book_value",
    "cash_flow",
    "free_cash_flow",
    "net_profit_margin",
    "operating_margin",
    "gross_margin",
    "return_on_equity",
    "return_on_assets",
    "volatility",
    "average_price",
    "beta_coefficient",
    "day_range",
    "intraday_high",
    "intraday_low",
    "intraday_open",
    "intraday_close",
    "closing_change",
    "trailing_pe",
    "forward_pe",
    "earnings_date",
    "option_volume",
    "call_put_ratio",
    "implied_volatility",
    "options_open_interest",
    "options_expiration_date",
    "dividend_date",
    "last_trade_time",
    "last_earnings_report_date",
    "datetime",
];

pub const TICKERS: [&str; 10] = [
    "AAPL", "GOOG", "MSFT", "AMZN", "TSLA", "NFLX", "FB", "NVDA", "SPY", "SPX",
];

const FIXED_COLUMNS: usize = 3;

const START_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2025, 1, 1) {
    Some(date) => date,
    None => panic!("invalid start date"),
};

/// Calendar used to fill a generated datetime column
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DateSchedule {
    /// Any day of 2025
    AnyDay,
    /// Any Monday of 2025
    Monday,
    /// Every other Sunday of 2025
    BiweeklySunday,
    /// First day of a quarter of 2025
    QuarterStart,
    /// Consecutive 15 minute steps from the start date
    QuarterHour,
}

impl DateSchedule {
    fn for_column(name: &str) -> Self {
        match name {
            "earnings_date" => Self::AnyDay,
            "options_expiration_date" => Self::Monday,
            "dividend_date" => Self::BiweeklySunday,
            "last_earnings_report_date" => Self::QuarterStart,
            _ => Self::QuarterHour,
        }
    }

    fn values(self, rng: &mut fastrand::Rng, n_rows: usize) -> Vec<NaiveDateTime> {
        let midnight = |date: NaiveDate| date.and_time(NaiveTime::MIN);
        let start = midnight(START_DATE);
        match self {
            Self::AnyDay => (0..n_rows)
                .map(|_| midnight(START_DATE + Days::new(rng.u64(0..365))))
                .collect(),
            // 2025-01-06 is the first Monday, 2025-12-29 the last one
            Self::Monday => (0..n_rows)
                .map(|_| midnight(START_DATE + Days::new(5 + 7 * rng.u64(0..52))))
                .collect(),
            // 2025-01-05 is the first Sunday, 2025-12-21 the last bi-weekly one
            Self::BiweeklySunday => (0..n_rows)
                .map(|_| midnight(START_DATE + Days::new(4 + 14 * rng.u64(0..26))))
                .collect(),
            Self::QuarterStart => (0..n_rows)
                .map(|_| {
                    let month = 1 + 3 * rng.u32(0..4);
                    midnight(START_DATE.with_month(month).unwrap_or(START_DATE))
                })
                .collect(),
            Self::QuarterHour => (0..n_rows)
                .map(|i| start + TimeDelta::minutes(15 * i as i64))
                .collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RandomKind {
    Int,
    Float,
    Bool,
    String,
    DateTime,
}

const RANDOM_KINDS: [RandomKind; 5] = [
    RandomKind::Int,
    RandomKind::Float,
    RandomKind::Bool,
    RandomKind::String,
    RandomKind::DateTime,
];

/// Generates synthetic stock-trading tables
#[derive(Debug)]
pub struct DataGenerator {
    rng: fastrand::Rng,
}

impl Default for DataGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DataGenerator {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// A generator that always produces the same table for the same shape
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Generate `n_rows` rows over `n_columns` uniquely named columns
    pub fn generate(&mut self, n_columns: usize, n_rows: usize) -> Result<RecordBatch> {
        if !(FIXED_COLUMNS..=STOCK_COLUMNS.len()).contains(&n_columns) {
            return Err(ScaffoldErr::InvalidArgument(format!(
                "number of columns must be between {FIXED_COLUMNS} and {}, got {n_columns}",
                STOCK_COLUMNS.len()
            )));
        }

        let mut fields = Vec::with_capacity(n_columns);
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(n_columns);

        fields.push(Field::new("id", DataType::Int64, false));
        columns.push(Arc::new(Int64Array::from_iter_values(1..=n_rows as i64)));

        fields.push(Field::new("business_date", timestamp_type(), false));
        columns.push(timestamp_array(business_days(n_rows)));

        fields.push(Field::new("ticker", DataType::Utf8, false));
        columns.push(Arc::new(StringArray::from_iter_values(
            (0..n_rows).map(|_| TICKERS[self.rng.usize(0..TICKERS.len())]),
        )));

        for name in &STOCK_COLUMNS[FIXED_COLUMNS..n_columns] {
            let kind = RANDOM_KINDS[self.rng.usize(0..RANDOM_KINDS.len())];
            debug!("Generating {kind:?} column {name}");
            let (data_type, array) = self.random_column(name, kind, n_rows);
            fields.push(Field::new(*name, data_type, false));
            columns.push(array);
        }

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }

    fn random_column(&mut self, name: &str, kind: RandomKind, n_rows: usize) -> (DataType, ArrayRef) {
        let rng = &mut self.rng;
        match kind {
            RandomKind::Int => (
                DataType::Int64,
                Arc::new(Int64Array::from_iter_values(
                    (0..n_rows).map(|_| rng.i64(0..100)),
                )),
            ),
            RandomKind::Float => (
                DataType::Float64,
                Arc::new(Float64Array::from_iter_values(
                    (0..n_rows).map(|_| (rng.f64() * 1000.0 * 100.0).round() / 100.0),
                )),
            ),
            RandomKind::Bool => (
                DataType::Boolean,
                Arc::new(BooleanArray::from(
                    (0..n_rows).map(|_| rng.bool()).collect::<Vec<_>>(),
                )),
            ),
            RandomKind::String => (
                DataType::Utf8,
                Arc::new(StringArray::from_iter_values((0..n_rows).map(|_| {
                    (0..5).map(|_| rng.alphabetic()).collect::<String>()
                }))),
            ),
            RandomKind::DateTime => (
                timestamp_type(),
                timestamp_array(DateSchedule::for_column(name).values(rng, n_rows)),
            ),
        }
    }
}

fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, None)
}

fn timestamp_array(values: Vec<NaiveDateTime>) -> ArrayRef {
    Arc::new(TimestampMicrosecondArray::from_iter_values(
        values.into_iter().map(|dt| dt.and_utc().timestamp_micros()),
    ))
}

/// Consecutive weekdays starting at the start date
fn business_days(n_rows: usize) -> Vec<NaiveDateTime> {
    START_DATE
        .iter_days()
        .filter(|date| !matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
        .take(n_rows)
        .map(|date| date.and_time(NaiveTime::MIN))
        .collect()
}
