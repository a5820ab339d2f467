//! Table helpers shared by the generators, the selector and the ranker
//!
//! Provides:
//! - Column kind classification over polars dtypes
//! - Typed column extraction with the engine's missing-value conventions
//! - Collision-free naming of derived columns
//! - Conversion of loosely-typed JSON values into tables
//! - Numeric encoding of a table into an ndarray feature matrix

mod json;
mod matrix;

pub use json::frame_from_json;
pub use matrix::{encode_features, encode_target, FeatureMatrix};

use crate::error::{FeatureError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Kind of values held by a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Float,
    Integer,
    Boolean,
    Categorical,
    DateTime,
    Other,
}

impl ColumnKind {
    /// Classify a polars dtype
    pub fn of(dtype: &DataType) -> Self {
        match dtype {
            DataType::Float32 | DataType::Float64 => ColumnKind::Float,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 |
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
                ColumnKind::Integer
            }
            DataType::Boolean => ColumnKind::Boolean,
            DataType::String | DataType::Categorical(_, _) | DataType::Enum(_, _) => {
                ColumnKind::Categorical
            }
            DataType::Datetime(_, _) | DataType::Date => ColumnKind::DateTime,
            _ => ColumnKind::Other,
        }
    }

    /// Float or integer columns. Booleans are not arithmetic inputs.
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Float | ColumnKind::Integer)
    }
}

/// Look up a column, mapping absence to [`FeatureError::ColumnNotFound`]
pub(crate) fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| FeatureError::ColumnNotFound(name.to_string()))
}

/// Kind of a named column
pub(crate) fn kind_of(df: &DataFrame, name: &str) -> Result<ColumnKind> {
    Ok(ColumnKind::of(column(df, name)?.dtype()))
}

/// Fail with [`FeatureError::ColumnNotFound`] for the first missing name
pub(crate) fn ensure_columns_exist(df: &DataFrame, names: &[String]) -> Result<()> {
    for name in names {
        column(df, name)?;
    }
    Ok(())
}

/// Extract a numeric column as `f64`, treating NaN as missing.
///
/// Fails with [`FeatureError::TypeMismatch`] for non-numeric columns.
pub(crate) fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let col = column(df, name)?;
    if !ColumnKind::of(col.dtype()).is_numeric() {
        return Err(FeatureError::TypeMismatch {
            column: name.to_string(),
            expected: "numeric".to_string(),
            actual: col.dtype().to_string(),
        });
    }

    let casted = col.cast(&DataType::Float64)?;
    let values = casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}

/// Numeric columns of a frame, in frame order
pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| ColumnKind::of(c.dtype()).is_numeric())
        .map(|c| c.name().to_string())
        .collect()
}

/// Hands out derived column names that never collide with existing ones
#[derive(Debug, Clone)]
pub(crate) struct NameRegistry {
    taken: HashSet<String>,
}

impl NameRegistry {
    pub(crate) fn for_frame(df: &DataFrame) -> Self {
        Self {
            taken: df
                .get_column_names()
                .into_iter()
                .map(|n| n.to_string())
                .collect(),
        }
    }

    /// Reserve `base`, or the first free `base_2`, `base_3`, ...
    pub(crate) fn claim(&mut self, base: String) -> String {
        if self.taken.insert(base.clone()) {
            return base;
        }

        let mut suffix = 2usize;
        loop {
            let candidate = format!("{}_{}", base, suffix);
            if self.taken.insert(candidate.clone()) {
                tracing::warn!(requested = %base, assigned = %candidate, "Derived column name already taken");
                return candidate;
            }
            suffix += 1;
        }
    }
}

/// Append derived columns to a copy of `df`
pub(crate) fn extend_frame(df: &DataFrame, derived: Vec<Column>) -> Result<DataFrame> {
    let mut columns: Vec<Column> = df.get_columns().to_vec();
    columns.extend(derived);
    Ok(DataFrame::new(columns)?)
}

/// Pairs `(i, j)` with `i < j`, ascending by `i` then `j`
pub(crate) fn unordered_pairs(n: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push((i, j));
        }
    }
    pairs
}
