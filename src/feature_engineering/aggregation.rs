//! Row-wise aggregation across columns

use super::{describe_columns, numeric_inputs, to_names, FeatureGenerator};
use crate::error::{FeatureError, Result};
use crate::table::{self, NameRegistry};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Prefix of every aggregate column, `agg_{op}`
pub const AGGREGATION_PREFIX: &str = "agg_";

/// Row-wise statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationOp {
    Sum,
    Mean,
    /// Sample standard deviation (ddof = 1)
    Std,
    Min,
    Max,
}

impl AggregationOp {
    /// Every operation in canonical order
    pub const ALL: [AggregationOp; 5] = [
        AggregationOp::Sum,
        AggregationOp::Mean,
        AggregationOp::Std,
        AggregationOp::Min,
        AggregationOp::Max,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AggregationOp::Sum => "sum",
            AggregationOp::Mean => "mean",
            AggregationOp::Std => "std",
            AggregationOp::Min => "min",
            AggregationOp::Max => "max",
        }
    }

    fn evaluate(&self, stats: &RowStats) -> Option<f64> {
        match self {
            AggregationOp::Sum => Some(stats.sum),
            AggregationOp::Mean => (stats.count > 0).then(|| stats.sum / stats.count as f64),
            AggregationOp::Std => stats.std(),
            AggregationOp::Min => stats.min,
            AggregationOp::Max => stats.max,
        }
    }
}

/// Statistics over the present values of one row
#[derive(Debug, Clone, Default)]
struct RowStats {
    count: usize,
    sum: f64,
    sum_sq_dev: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl RowStats {
    fn from_values(values: impl Iterator<Item = f64> + Clone) -> Self {
        let mut stats = RowStats::default();
        for v in values.clone() {
            stats.count += 1;
            stats.sum += v;
            stats.min = Some(stats.min.map_or(v, |m| m.min(v)));
            stats.max = Some(stats.max.map_or(v, |m| m.max(v)));
        }
        if stats.count > 1 {
            let mean = stats.sum / stats.count as f64;
            stats.sum_sq_dev = values.map(|v| (v - mean).powi(2)).sum();
        }
        stats
    }

    fn std(&self) -> Option<f64> {
        (self.count > 1).then(|| (self.sum_sq_dev / (self.count - 1) as f64).sqrt())
    }
}

/// Row-wise aggregation generator.
///
/// Adds one `agg_{op}` column per requested operation, computed over the
/// present values of the named columns in each row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationFeatures {
    columns: Vec<String>,
    operations: Vec<AggregationOp>,
}

impl AggregationFeatures {
    /// All aggregations over `columns`
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: to_names(columns),
            operations: AggregationOp::ALL.to_vec(),
        }
    }

    pub fn with_operations(mut self, operations: Vec<AggregationOp>) -> Self {
        self.operations = operations;
        self
    }

    /// Requested operations, de-duplicated, in canonical order
    fn resolved_operations(&self) -> Vec<AggregationOp> {
        let mut ops = self.operations.clone();
        ops.sort();
        ops.dedup();
        ops
    }
}

impl FeatureGenerator for AggregationFeatures {
    fn kind(&self) -> &'static str {
        "aggregation"
    }

    fn generate(&self, df: &DataFrame) -> Result<DataFrame> {
        let operations = self.resolved_operations();
        if operations.is_empty() {
            return Err(FeatureError::invalid_parameter(
                "operations",
                "[]",
                "at least one aggregation is required",
            ));
        }

        let (names, values) = numeric_inputs(df, &self.columns, 1)?;

        let rows: Vec<RowStats> = (0..df.height())
            .into_par_iter()
            .map(|row| RowStats::from_values(values.iter().filter_map(|col| col[row])))
            .collect();

        let mut registry = NameRegistry::for_frame(df);
        let derived: Vec<Column> = operations
            .iter()
            .map(|op| {
                let data: Vec<Option<f64>> = rows.iter().map(|stats| op.evaluate(stats)).collect();
                let name = registry.claim(format!("{}{}", AGGREGATION_PREFIX, op.name()));
                Column::new(name.into(), data)
            })
            .collect();

        tracing::debug!(
            columns = %describe_columns(&names),
            operations = ?operations,
            "Generated aggregation features"
        );

        table::extend_frame(df, derived)
    }
}
