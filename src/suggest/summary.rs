//! Compact table description used as prompt context

use crate::error::Result;
use crate::table::{self, ColumnKind};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Most frequent values reported per text column
const TOP_VALUES: usize = 5;
/// Text columns with value counts
const MAX_TEXT_COLUMNS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub missing_count: usize,
    pub missing_pct: f64,
    pub numeric: Option<NumericSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCounts {
    pub column: String,
    /// `(value, count)`, most frequent first
    pub counts: Vec<(String, usize)>,
}

/// Shape, types, missingness and distributions of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    pub top_values: Vec<ValueCounts>,
    pub target: Option<String>,
    pub target_distribution: Option<Vec<(String, usize)>>,
}

impl TableSummary {
    pub fn from_frame(df: &DataFrame, target: Option<&str>) -> Result<Self> {
        let rows = df.height();

        let mut columns = Vec::with_capacity(df.width());
        let mut top_values = Vec::new();
        for col in df.get_columns() {
            let name = col.name().to_string();
            let kind = ColumnKind::of(col.dtype());
            let missing_count = col.null_count();

            let numeric = if kind.is_numeric() {
                Some(numeric_summary(&table::numeric_values(df, &name)?))
            } else {
                None
            };

            if kind == ColumnKind::Categorical && top_values.len() < MAX_TEXT_COLUMNS {
                let mut counts = value_counts(col)?;
                counts.truncate(TOP_VALUES);
                top_values.push(ValueCounts {
                    column: name.clone(),
                    counts,
                });
            }

            columns.push(ColumnSummary {
                name,
                dtype: col.dtype().to_string(),
                missing_count,
                missing_pct: if rows > 0 {
                    missing_count as f64 / rows as f64 * 100.0
                } else {
                    0.0
                },
                numeric,
            });
        }

        let target_distribution = match target {
            Some(t) => Some(value_counts(table::column(df, t)?)?),
            None => None,
        };

        Ok(Self {
            rows,
            columns,
            top_values,
            target: target.map(str::to_string),
            target_distribution,
        })
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Detailed description of one column, used when asking about a specific issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub missing_count: usize,
    pub missing_pct: f64,
    pub unique_values: usize,
    pub total_rows: usize,
    pub numeric: Option<NumericSummary>,
    pub median: Option<f64>,
    /// Most frequent values of non-numeric columns
    pub top_values: Option<Vec<(String, usize)>>,
    /// First present values, in row order
    pub sample_values: Vec<Value>,
}

impl ColumnInfo {
    pub fn from_frame(df: &DataFrame, name: &str) -> Result<Self> {
        let col = table::column(df, name)?;
        let rows = df.height();
        let missing_count = col.null_count();
        let unique_values = col.as_materialized_series().drop_nulls().n_unique()?;

        let (numeric, median, top_values, sample_values) = if ColumnKind::of(col.dtype()).is_numeric() {
            let values = table::numeric_values(df, name)?;
            let samples = values
                .iter()
                .flatten()
                .copied()
                .take(TOP_VALUES)
                .map(Value::from)
                .collect();
            (Some(numeric_summary(&values)), median(&values), None, samples)
        } else {
            let mut counts = value_counts(col)?;
            counts.truncate(TOP_VALUES);
            let casted = col.cast(&DataType::String)?;
            let samples = casted
                .str()?
                .into_iter()
                .flatten()
                .take(TOP_VALUES)
                .map(Value::from)
                .collect();
            (None, None, Some(counts), samples)
        };

        Ok(Self {
            name: name.to_string(),
            dtype: col.dtype().to_string(),
            missing_count,
            missing_pct: if rows > 0 {
                missing_count as f64 / rows as f64 * 100.0
            } else {
                0.0
            },
            unique_values,
            total_rows: rows,
            numeric,
            median,
            top_values,
            sample_values,
        })
    }
}

fn median(values: &[Option<f64>]) -> Option<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(|a, b| a.total_cmp(b));
    let mid = present.len() / 2;
    Some(if present.len() % 2 == 0 {
        (present[mid - 1] + present[mid]) / 2.0
    } else {
        present[mid]
    })
}

fn numeric_summary(values: &[Option<f64>]) -> NumericSummary {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let count = present.len();
    if count == 0 {
        return NumericSummary {
            count,
            mean: None,
            std: None,
            min: None,
            max: None,
        };
    }

    let mean = present.iter().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
        (present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64).sqrt()
    });

    NumericSummary {
        count,
        mean: Some(mean),
        std,
        min: present.iter().copied().reduce(f64::min),
        max: present.iter().copied().reduce(f64::max),
    }
}

/// Counts of present values, most frequent first, ties by value
fn value_counts(col: &Column) -> Result<Vec<(String, usize)>> {
    let casted = col.cast(&DataType::String)?;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in casted.str()?.into_iter().flatten() {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }

    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let df = df!(
            "age" => &[Some(20.0), Some(40.0), None, Some(30.0)],
            "city" => &["sf", "la", "sf", "ny"],
            "target" => &[1i64, 0, 1, 1],
        )
        .unwrap();

        let summary = TableSummary::from_frame(&df, Some("target")).unwrap();
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.column_names(), vec!["age", "city", "target"]);

        let age = &summary.columns[0];
        assert_eq!(age.missing_count, 1);
        assert_eq!(age.missing_pct, 25.0);
        let numeric = age.numeric.as_ref().unwrap();
        assert_eq!(numeric.mean, Some(30.0));
        assert_eq!(numeric.std, Some(10.0));
        assert_eq!(numeric.min, Some(20.0));

        assert_eq!(summary.top_values.len(), 1);
        assert_eq!(summary.top_values[0].counts[0], ("sf".to_string(), 2));
        assert_eq!(
            summary.target_distribution,
            Some(vec![("1".to_string(), 3), ("0".to_string(), 1)])
        );

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["rows"], 4);
    }

    #[test]
    fn test_column_info() {
        let df = df!(
            "age" => &[Some(20.0), Some(40.0), None, Some(30.0), Some(35.0)],
            "city" => &["sf", "la", "sf", "ny", "sf"],
        )
        .unwrap();

        let age = ColumnInfo::from_frame(&df, "age").unwrap();
        assert_eq!(age.total_rows, 5);
        assert_eq!(age.missing_count, 1);
        assert_eq!(age.unique_values, 4);
        assert_eq!(age.median, Some(32.5));
        assert!(age.top_values.is_none());
        assert_eq!(age.sample_values.len(), 4);

        let city = ColumnInfo::from_frame(&df, "city").unwrap();
        assert!(city.numeric.is_none());
        assert_eq!(city.top_values.as_ref().unwrap()[0], ("sf".to_string(), 3));
        assert_eq!(city.sample_values[0], "sf");

        assert!(matches!(
            ColumnInfo::from_frame(&df, "nope"),
            Err(crate::error::FeatureError::ColumnNotFound(_))
        ));
    }
}
