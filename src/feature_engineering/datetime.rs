//! Calendar decomposition of datetime columns

use super::{describe_columns, to_names, unique_columns, FeatureGenerator};
use crate::error::{FeatureError, Result};
use crate::table::{self, ColumnKind, NameRegistry};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Days from 0001-01-01 (CE day 1) to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Calendar component extracted from a timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatetimePart {
    Year,
    Month,
    Day,
    /// Monday = 0 .. Sunday = 6
    DayOfWeek,
    /// 1..=4
    Quarter,
    Hour,
}

impl DatetimePart {
    pub const ALL: [DatetimePart; 6] = [
        DatetimePart::Year,
        DatetimePart::Month,
        DatetimePart::Day,
        DatetimePart::DayOfWeek,
        DatetimePart::Quarter,
        DatetimePart::Hour,
    ];

    /// Suffix used in `{col}_{part}`
    pub fn name(&self) -> &'static str {
        match self {
            DatetimePart::Year => "year",
            DatetimePart::Month => "month",
            DatetimePart::Day => "day",
            DatetimePart::DayOfWeek => "dayofweek",
            DatetimePart::Quarter => "quarter",
            DatetimePart::Hour => "hour",
        }
    }

    fn extract(&self, ts: &NaiveDateTime) -> i32 {
        match self {
            DatetimePart::Year => ts.year(),
            DatetimePart::Month => ts.month() as i32,
            DatetimePart::Day => ts.day() as i32,
            DatetimePart::DayOfWeek => ts.weekday().num_days_from_monday() as i32,
            DatetimePart::Quarter => ((ts.month() - 1) / 3 + 1) as i32,
            DatetimePart::Hour => ts.hour() as i32,
        }
    }
}

/// Datetime decomposition generator.
///
/// Fails on any non-datetime column instead of skipping it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatetimeFeatures {
    columns: Vec<String>,
    parts: Vec<DatetimePart>,
}

impl DatetimeFeatures {
    /// All parts of `columns`
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: to_names(columns),
            parts: DatetimePart::ALL.to_vec(),
        }
    }

    pub fn with_parts(mut self, parts: Vec<DatetimePart>) -> Self {
        self.parts = parts;
        self
    }
}

/// Timestamps of a Datetime or Date column as UTC wall-clock values
fn timestamps(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDateTime>>> {
    let col = table::column(df, name)?;

    match col.dtype() {
        DataType::Datetime(unit, _) => {
            let per_second: i64 = match unit {
                TimeUnit::Nanoseconds => 1_000_000_000,
                TimeUnit::Microseconds => 1_000_000,
                TimeUnit::Milliseconds => 1_000,
            };
            let nanos_per_tick = 1_000_000_000 / per_second;
            let physical = col.cast(&DataType::Int64)?;
            Ok(physical
                .i64()?
                .into_iter()
                .map(|v| {
                    v.and_then(|ticks| {
                        let secs = ticks.div_euclid(per_second);
                        let nanos = (ticks.rem_euclid(per_second) * nanos_per_tick) as u32;
                        DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc())
                    })
                })
                .collect())
        }
        DataType::Date => {
            let physical = col.cast(&DataType::Int32)?;
            Ok(physical
                .i32()?
                .into_iter()
                .map(|v| {
                    v.and_then(|days| {
                        NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
                            .and_then(|d| d.and_hms_opt(0, 0, 0))
                    })
                })
                .collect())
        }
        other => Err(FeatureError::TypeMismatch {
            column: name.to_string(),
            expected: "datetime or date".to_string(),
            actual: other.to_string(),
        }),
    }
}

impl FeatureGenerator for DatetimeFeatures {
    fn kind(&self) -> &'static str {
        "datetime"
    }

    fn generate(&self, df: &DataFrame) -> Result<DataFrame> {
        let names = unique_columns(&self.columns);
        table::ensure_columns_exist(df, &names)?;

        // Validate every column before doing any work
        for name in &names {
            let kind = table::kind_of(df, name)?;
            if kind != ColumnKind::DateTime {
                return Err(FeatureError::TypeMismatch {
                    column: name.clone(),
                    expected: "datetime or date".to_string(),
                    actual: table::column(df, name)?.dtype().to_string(),
                });
            }
        }

        let mut registry = NameRegistry::for_frame(df);
        let mut derived = Vec::with_capacity(names.len() * self.parts.len());
        for name in &names {
            let stamps = timestamps(df, name)?;
            for part in &self.parts {
                let data: Vec<Option<i32>> = stamps
                    .iter()
                    .map(|ts| ts.as_ref().map(|t| part.extract(t)))
                    .collect();
                let out_name = registry.claim(format!("{}_{}", name, part.name()));
                derived.push(Column::new(out_name.into(), data));
            }
        }

        tracing::debug!(
            columns = %describe_columns(&names),
            added = derived.len(),
            "Generated datetime features"
        );

        table::extend_frame(df, derived)
    }
}
