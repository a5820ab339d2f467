//! Feature interaction generation

use super::{describe_columns, numeric_inputs, to_names, FeatureGenerator};
use crate::error::Result;
use crate::table::{self, NameRegistry};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Infix of the default multiplicative interaction, `{a}_x_{b}`
pub const INTERACTION_INFIX: &str = "_x_";

/// Type of interaction to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionType {
    /// Multiplication: x1 * x2
    Multiply,
    /// Addition: x1 + x2
    Add,
    /// Subtraction: x1 - x2
    Subtract,
    /// Absolute difference: |x1 - x2|
    AbsDiff,
    /// Maximum: max(x1, x2)
    Max,
    /// Minimum: min(x1, x2)
    Min,
    /// Mean: (x1 + x2) / 2
    Mean,
}

impl InteractionType {
    /// Apply interaction operation
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            InteractionType::Multiply => a * b,
            InteractionType::Add => a + b,
            InteractionType::Subtract => a - b,
            InteractionType::AbsDiff => (a - b).abs(),
            InteractionType::Max => a.max(b),
            InteractionType::Min => a.min(b),
            InteractionType::Mean => (a + b) / 2.0,
        }
    }

    /// Infix placed between the two source names
    pub fn infix(&self) -> &'static str {
        match self {
            InteractionType::Multiply => INTERACTION_INFIX,
            InteractionType::Add => "_plus_",
            InteractionType::Subtract => "_minus_",
            InteractionType::AbsDiff => "_absdiff_",
            InteractionType::Max => "_max_",
            InteractionType::Min => "_min_",
            InteractionType::Mean => "_mean_",
        }
    }
}

/// Pairwise interaction generator.
///
/// For every pair `(i, j)` with `i < j` in the given column order and every
/// operation in order, emits `{a}{infix}{b}`. The result is truncated after
/// `max_interactions` columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionFeatures {
    columns: Vec<String>,
    max_interactions: Option<usize>,
    operations: Vec<InteractionType>,
}

impl InteractionFeatures {
    /// Multiplicative interactions over `columns`
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: to_names(columns),
            max_interactions: None,
            operations: vec![InteractionType::Multiply],
        }
    }

    /// Cap the number of generated columns
    pub fn with_max_interactions(mut self, max: Option<usize>) -> Self {
        self.max_interactions = max;
        self
    }

    /// Replace the operation set
    pub fn with_operations(mut self, operations: Vec<InteractionType>) -> Self {
        self.operations = operations;
        self
    }
}

impl FeatureGenerator for InteractionFeatures {
    fn kind(&self) -> &'static str {
        "interactions"
    }

    fn generate(&self, df: &DataFrame) -> Result<DataFrame> {
        let (names, values) = numeric_inputs(df, &self.columns, 2)?;
        let limit = self.max_interactions.unwrap_or(usize::MAX);

        let mut registry = NameRegistry::for_frame(df);
        let mut derived = Vec::new();

        'pairs: for (i, j) in table::unordered_pairs(names.len()) {
            for op in &self.operations {
                if derived.len() >= limit {
                    break 'pairs;
                }
                let data: Vec<Option<f64>> = values[i]
                    .iter()
                    .zip(&values[j])
                    .map(|(a, b)| Some(op.apply((*a)?, (*b)?)))
                    .collect();
                let name = registry.claim(format!("{}{}{}", names[i], op.infix(), names[j]));
                derived.push(Column::new(name.into(), data));
            }
        }

        tracing::debug!(
            columns = %describe_columns(&names),
            added = derived.len(),
            "Generated interaction features"
        );

        table::extend_frame(df, derived)
    }
}
