//! Feature engine
//!
//! Holds a validated table and an optional target column, and exposes every
//! generator, the selector and the importance ranker as methods. Each method
//! returns a new table; chain by wrapping the result in another engine.

use crate::config::TaskType;
use crate::error::{FeatureError, Result};
use crate::feature_engineering::{
    AggregationFeatures, AggregationOp, BinnedFeatures, BinningMode, BinningStrategy,
    DatetimeFeatures, DatetimePart, FeatureGenerator, InteractionFeatures, PolynomialFeatures,
    RatioFeatures,
};
use crate::importance::FeatureImportance;
use crate::selection::{FeatureSelector, SelectionMethod, SelectionReport};
use crate::table;
use polars::prelude::*;
use serde_json::Value;
use std::collections::HashMap;

/// Validated table plus optional supervised target
#[derive(Debug, Clone)]
pub struct FeatureEngine {
    df: DataFrame,
    target: Option<String>,
}

impl FeatureEngine {
    /// Validate `df` and bind the optional target.
    ///
    /// Fails on an empty table or a target that is not a column of `df`.
    pub fn new(df: DataFrame, target: Option<&str>) -> Result<Self> {
        let (rows, columns) = df.shape();
        if rows == 0 || columns == 0 {
            return Err(FeatureError::EmptyInput { rows, columns });
        }

        if let Some(target) = target {
            if df.column(target).is_err() {
                return Err(FeatureError::TargetNotFound(target.to_string()));
            }
        }

        tracing::debug!(rows, columns, target = ?target, "Created feature engine");

        Ok(Self {
            df,
            target: target.map(str::to_string),
        })
    }

    /// Build the table from a JSON value, then validate as [`Self::new`]
    pub fn from_json(value: &Value, target: Option<&str>) -> Result<Self> {
        Self::new(table::frame_from_json(value)?, target)
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        self.df.shape()
    }

    pub fn into_frame(self) -> DataFrame {
        self.df
    }

    fn require_target(&self, operation: &'static str) -> Result<&str> {
        self.target
            .as_deref()
            .ok_or(FeatureError::TargetRequired(operation))
    }

    /// Run any generator against the held table
    pub fn apply(&self, generator: &dyn FeatureGenerator) -> Result<DataFrame> {
        generator.generate(&self.df)
    }

    pub fn create_polynomial_features(
        &self,
        columns: &[&str],
        degree: usize,
        interaction_only: bool,
    ) -> Result<DataFrame> {
        self.apply(
            &PolynomialFeatures::new(columns.iter().copied())
                .with_degree(degree)
                .interaction_only(interaction_only),
        )
    }

    pub fn create_interactions(&self, columns: &[&str], max_interactions: Option<usize>) -> Result<DataFrame> {
        self.apply(&InteractionFeatures::new(columns.iter().copied()).with_max_interactions(max_interactions))
    }

    pub fn create_ratio_features(&self, columns: &[&str], max_ratios: Option<usize>) -> Result<DataFrame> {
        self.apply(&RatioFeatures::new(columns.iter().copied()).with_max_ratios(max_ratios))
    }

    /// Append `{col}_binned` for each column
    pub fn create_binned_features(
        &self,
        columns: &[&str],
        n_bins: usize,
        strategy: BinningStrategy,
    ) -> Result<DataFrame> {
        self.create_binned_features_with_mode(columns, n_bins, strategy, BinningMode::Add)
    }

    pub fn create_binned_features_with_mode(
        &self,
        columns: &[&str],
        n_bins: usize,
        strategy: BinningStrategy,
        mode: BinningMode,
    ) -> Result<DataFrame> {
        self.apply(
            &BinnedFeatures::new(columns.iter().copied(), n_bins)
                .with_strategy(strategy)
                .with_mode(mode),
        )
    }

    /// Row-wise aggregations; all of them when `operations` is `None`
    pub fn create_aggregation_features(
        &self,
        columns: &[&str],
        operations: Option<&[AggregationOp]>,
    ) -> Result<DataFrame> {
        let mut generator = AggregationFeatures::new(columns.iter().copied());
        if let Some(ops) = operations {
            generator = generator.with_operations(ops.to_vec());
        }
        self.apply(&generator)
    }

    /// Calendar parts of datetime columns; all parts when `parts` is `None`
    pub fn create_datetime_features(
        &self,
        columns: &[&str],
        parts: Option<&[DatetimePart]>,
    ) -> Result<DataFrame> {
        let mut generator = DatetimeFeatures::new(columns.iter().copied());
        if let Some(parts) = parts {
            generator = generator.with_parts(parts.to_vec());
        }
        self.apply(&generator)
    }

    /// Keep the `k` best non-target columns plus the target
    pub fn select_features(&self, method: SelectionMethod, k: usize, task: TaskType) -> Result<DataFrame> {
        self.selection_report(method, k, task)?.apply(&self.df)
    }

    /// Scores and chosen columns without projecting the table
    pub fn selection_report(&self, method: SelectionMethod, k: usize, task: TaskType) -> Result<SelectionReport> {
        let target = self.require_target("feature selection")?;
        FeatureSelector::new(method, k).with_task(task).fit(&self.df, target)
    }

    /// Selection score of every non-target column
    pub fn feature_scores(&self, method: SelectionMethod, task: TaskType) -> Result<Vec<(String, f64)>> {
        let target = self.require_target("feature scoring")?;
        FeatureSelector::new(method, 1)
            .with_task(task)
            .score_frame(&self.df, target)
    }

    /// Random-forest importance of every non-target column
    pub fn get_feature_importance(&self, task: TaskType) -> Result<HashMap<String, f64>> {
        self.feature_importance(&FeatureImportance::new(task))
    }

    /// Importance with a custom ranker configuration
    pub fn feature_importance(&self, ranker: &FeatureImportance) -> Result<HashMap<String, f64>> {
        let target = self.require_target("feature importance")?;
        Ok(ranker.compute(&self.df, target)?.into_map())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DataFrame {
        df!(
            "age" => &[25.0, 32.0, 47.0, 51.0, 62.0, 23.0],
            "income" => &[30_000.0, 45_000.0, 80_000.0, 72_000.0, 95_000.0, 28_000.0],
            "target" => &[0i64, 0, 1, 1, 1, 0],
        )
        .unwrap()
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            FeatureEngine::new(DataFrame::empty(), None),
            Err(FeatureError::EmptyInput { .. })
        ));
        assert!(matches!(
            FeatureEngine::new(sample(), Some("nonexistent")),
            Err(FeatureError::TargetNotFound(_))
        ));
        assert!(matches!(
            FeatureEngine::from_json(&json!("not a dataframe"), None),
            Err(FeatureError::InputType(_))
        ));

        let engine = FeatureEngine::new(sample(), Some("target")).unwrap();
        assert_eq!(engine.shape(), (6, 3));
        assert_eq!(engine.target(), Some("target"));
    }

    #[test]
    fn test_unsupervised_engine_rejects_supervised_operations() {
        let engine = FeatureEngine::new(sample(), None).unwrap();
        assert!(matches!(
            engine.select_features(SelectionMethod::MutualInfo, 1, TaskType::Classification),
            Err(FeatureError::TargetRequired(_))
        ));
        assert!(matches!(
            engine.get_feature_importance(TaskType::Classification),
            Err(FeatureError::TargetRequired(_))
        ));

        // Generators still work
        let expanded = engine.create_interactions(&["age", "income"], None).unwrap();
        assert_eq!(expanded.width(), 4);
    }

    #[test]
    fn test_chaining() {
        let engine = FeatureEngine::new(sample(), Some("target")).unwrap();
        let df1 = engine.create_interactions(&["age", "income"], None).unwrap();

        let engine2 = FeatureEngine::new(df1.clone(), Some("target")).unwrap();
        let df2 = engine2.create_ratio_features(&["age", "income"], None).unwrap();

        let engine3 = FeatureEngine::new(df2.clone(), Some("target")).unwrap();
        let df3 = engine3
            .create_aggregation_features(&["age", "income"], Some(&[AggregationOp::Mean]))
            .unwrap();

        assert!(df3.width() > df2.width());
        assert!(df2.width() > df1.width());
        assert_eq!(df3.height(), 6);
        // Source table untouched
        assert_eq!(engine.shape(), (6, 3));
    }

    #[test]
    fn test_importance_covers_every_feature() {
        let engine = FeatureEngine::new(sample(), Some("target")).unwrap();
        let importance = engine.get_feature_importance(TaskType::Classification).unwrap();
        assert_eq!(importance.len(), 2);
        assert!(importance.values().all(|&v| v >= 0.0));
        assert!(!importance.contains_key("target"));
    }
}
