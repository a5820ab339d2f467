//! Feature engineering configuration

use crate::feature_engineering::{AggregationOp, BinningStrategy};
use crate::selection::SelectionMethod;
use crate::table::ColumnKind;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Supervised learning task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    Classification,
    Regression,
}

impl TaskType {
    /// Most distinct values an integer target may have and still be treated
    /// as class labels
    pub const MAX_INFERRED_CLASSES: usize = 20;

    /// Guess the task from the target column.
    ///
    /// Text and boolean targets are classification. Integer targets with at
    /// most [`Self::MAX_INFERRED_CLASSES`] distinct values are classification.
    /// Everything else is regression.
    pub fn infer(target: &Column) -> Self {
        match ColumnKind::of(target.dtype()) {
            ColumnKind::Categorical | ColumnKind::Boolean => TaskType::Classification,
            ColumnKind::Integer => match target.as_materialized_series().n_unique() {
                Ok(n) if n <= Self::MAX_INFERRED_CLASSES => TaskType::Classification,
                _ => TaskType::Regression,
            },
            _ => TaskType::Regression,
        }
    }
}

/// Configuration for [`auto_feature_engineering_with_config`](crate::auto::auto_feature_engineering_with_config)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoFeatureConfig {
    /// Columns to derive features from; all numeric non-target columns when unset
    pub numeric_columns: Option<Vec<String>>,

    /// Supervised target column
    pub target_column: Option<String>,

    /// Keep only the k best features (plus the target) at the end
    pub select_top_k: Option<usize>,

    /// Scoring method used when `select_top_k` is set
    pub selection_method: SelectionMethod,

    /// Task used for selection; inferred from the target when unset
    pub task: Option<TaskType>,

    /// Cap on pairwise interaction columns
    pub max_interactions: Option<usize>,

    /// Cap on ratio columns
    pub max_ratios: Option<usize>,

    /// Row-wise aggregations to add
    pub aggregations: Vec<AggregationOp>,

    /// Also add polynomial terms of this degree
    pub polynomial_degree: Option<usize>,

    /// Also add binned copies with this many bins
    pub binning_bins: Option<usize>,

    /// Strategy for the optional binning step
    pub binning_strategy: BinningStrategy,
}

impl Default for AutoFeatureConfig {
    fn default() -> Self {
        Self {
            numeric_columns: None,
            target_column: None,
            select_top_k: None,
            selection_method: SelectionMethod::MutualInfo,
            task: None,
            max_interactions: None,
            max_ratios: None,
            aggregations: AggregationOp::ALL.to_vec(),
            polynomial_degree: None,
            binning_bins: None,
            binning_strategy: BinningStrategy::Uniform,
        }
    }
}

impl AutoFeatureConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the source columns
    pub fn with_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.numeric_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Builder method to set the target column
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_column = Some(target.into());
        self
    }

    /// Builder method to enable top-k selection
    pub fn with_select_top_k(mut self, k: usize) -> Self {
        self.select_top_k = Some(k);
        self
    }

    /// Builder method to set the selection method
    pub fn with_selection_method(mut self, method: SelectionMethod) -> Self {
        self.selection_method = method;
        self
    }

    /// Builder method to fix the task instead of inferring it
    pub fn with_task(mut self, task: TaskType) -> Self {
        self.task = Some(task);
        self
    }

    /// Builder method to cap interaction columns
    pub fn with_max_interactions(mut self, max: usize) -> Self {
        self.max_interactions = Some(max);
        self
    }

    /// Builder method to cap ratio columns
    pub fn with_max_ratios(mut self, max: usize) -> Self {
        self.max_ratios = Some(max);
        self
    }

    /// Builder method to choose the aggregations
    pub fn with_aggregations(mut self, operations: Vec<AggregationOp>) -> Self {
        self.aggregations = operations;
        self
    }

    /// Builder method to add polynomial terms
    pub fn with_polynomial_degree(mut self, degree: usize) -> Self {
        self.polynomial_degree = Some(degree);
        self
    }

    /// Builder method to add binned copies
    pub fn with_binning(mut self, n_bins: usize, strategy: BinningStrategy) -> Self {
        self.binning_bins = Some(n_bins);
        self.binning_strategy = strategy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = AutoFeatureConfig::new()
            .with_columns(["age", "income"])
            .with_target("target")
            .with_select_top_k(5)
            .with_aggregations(vec![AggregationOp::Mean]);

        assert_eq!(config.numeric_columns.as_deref().map(|c| c.len()), Some(2));
        assert_eq!(config.target_column.as_deref(), Some("target"));
        assert_eq!(config.select_top_k, Some(5));
        assert_eq!(config.aggregations, vec![AggregationOp::Mean]);
    }

    #[test]
    fn test_defaults() {
        let config = AutoFeatureConfig::default();
        assert_eq!(TaskType::default(), TaskType::Classification);
        assert_eq!(config.binning_strategy, BinningStrategy::default());
        assert_eq!(BinningStrategy::default(), BinningStrategy::Uniform);
        assert_eq!(config.selection_method, SelectionMethod::default());
    }

    #[test]
    fn test_config_serialize() {
        let config = AutoFeatureConfig::new().with_task(TaskType::Regression);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"task\":\"regression\""));

        let restored: AutoFeatureConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.task, Some(TaskType::Regression));
        assert_eq!(restored.aggregations.len(), 5);
    }

    #[test]
    fn test_infer_task() {
        let labels = Column::new("y".into(), &[0i64, 1, 0, 1]);
        assert_eq!(TaskType::infer(&labels), TaskType::Classification);

        let values = Column::new("y".into(), &[0.5, 1.5, 2.5]);
        assert_eq!(TaskType::infer(&values), TaskType::Regression);

        let wide: Vec<i64> = (0..100).collect();
        let wide = Column::new("y".into(), wide);
        assert_eq!(TaskType::infer(&wide), TaskType::Regression);

        let text = Column::new("y".into(), &["a", "b"]);
        assert_eq!(TaskType::infer(&text), TaskType::Classification);
    }
}
