//! Feature generation module
//!
//! Provides deterministic table expansion including:
//! - Polynomial terms
//! - Pairwise interactions
//! - Ratios with a zero-division policy
//! - Binning / discretization
//! - Row-wise aggregations
//! - Datetime decomposition
//!
//! Every generator borrows its input table and returns a new one. Source
//! columns are kept unless a generator is explicitly put in a replacing mode.

mod polynomial;
mod interactions;
mod ratio;
mod binning;
mod aggregation;
mod datetime;

pub use polynomial::PolynomialFeatures;
pub use interactions::{InteractionFeatures, InteractionType, INTERACTION_INFIX};
pub use ratio::{RatioFeatures, ZeroDivision, RATIO_INFIX};
pub use binning::{BinnedFeatures, BinningMode, BinningStrategy, BINNED_SUFFIX};
pub use aggregation::{AggregationFeatures, AggregationOp, AGGREGATION_PREFIX};
pub use datetime::{DatetimeFeatures, DatetimePart};

use crate::error::{FeatureError, Result};
use crate::table;
use polars::prelude::*;

/// A pure table-to-table transformation that derives new columns
pub trait FeatureGenerator: Send + Sync {
    /// Short name of the transformation, used in logs
    fn kind(&self) -> &'static str;

    /// Derive features from `df`, returning a new table with the same rows
    fn generate(&self, df: &DataFrame) -> Result<DataFrame>;
}

/// Apply generators in order, feeding each output into the next
pub fn generate_all(df: &DataFrame, generators: &[&dyn FeatureGenerator]) -> Result<DataFrame> {
    let mut current = df.clone();
    for generator in generators {
        let before = current.width();
        current = generator.generate(&current)?;
        tracing::debug!(
            generator = generator.kind(),
            added = current.width().saturating_sub(before),
            width = current.width(),
            "Applied feature generator"
        );
    }
    Ok(current)
}

/// Column list rendered for error messages
pub(crate) fn describe_columns(columns: &[String]) -> String {
    columns.join(", ")
}

/// Drop repeated names, keeping first occurrences in order
pub(crate) fn unique_columns(columns: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    columns
        .iter()
        .filter(|c| seen.insert(c.as_str()))
        .cloned()
        .collect()
}

/// Validate and extract the numeric inputs of a multi-column generator.
///
/// Needs at least `min_columns` distinct names, all present and numeric.
pub(crate) fn numeric_inputs(
    df: &DataFrame,
    columns: &[String],
    min_columns: usize,
) -> Result<(Vec<String>, Vec<Vec<Option<f64>>>)> {
    let names = unique_columns(columns);
    if names.len() < min_columns {
        return Err(FeatureError::invalid_parameter(
            "columns",
            describe_columns(&names),
            format!("at least {} distinct columns are required", min_columns),
        ));
    }

    table::ensure_columns_exist(df, &names)?;
    let values = names
        .iter()
        .map(|name| table::numeric_values(df, name))
        .collect::<Result<Vec<_>>>()?;

    Ok((names, values))
}

pub(crate) fn to_names<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Vec<String> {
    columns.into_iter().map(Into::into).collect()
}
