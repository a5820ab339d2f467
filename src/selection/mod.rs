//! Supervised feature selection
//!
//! Scores every non-target column against the target and keeps the k best:
//! - Mutual information (histogram estimate)
//! - F-test (ANOVA for classification, univariate regression otherwise)
//! - Chi-squared (classification, non-negative features)
//! - Absolute Pearson correlation

mod scores;

use crate::config::TaskType;
use crate::error::{FeatureError, Result};
use crate::table::{encode_features, encode_target};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Scoring method for feature selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    #[default]
    MutualInfo,
    FTest,
    Chi2,
    Correlation,
}

/// Scores and the chosen columns of one selection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionReport {
    pub method: SelectionMethod,
    pub task: TaskType,
    pub target: String,
    /// `(column, score)` for every non-target column, in table order
    pub scores: Vec<(String, f64)>,
    /// Kept columns, in table order
    pub selected: Vec<String>,
}

impl SelectionReport {
    /// Project `df` onto the selected columns plus the target, keeping order
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let keep: HashSet<&str> = self
            .selected
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.target.as_str()))
            .collect();

        let columns: Vec<Column> = df
            .get_columns()
            .iter()
            .filter(|c| keep.contains(c.name().as_str()))
            .cloned()
            .collect();
        Ok(DataFrame::new(columns)?)
    }

    /// Get feature ranking (1 = best)
    pub fn ranking(&self) -> Vec<(String, usize)> {
        let order = rank_order(&self.scores.iter().map(|(_, s)| *s).collect::<Vec<_>>());
        let mut ranking = vec![0; order.len()];
        for (rank, idx) in order.into_iter().enumerate() {
            ranking[idx] = rank + 1;
        }
        self.scores
            .iter()
            .zip(ranking)
            .map(|((name, _), rank)| (name.clone(), rank))
            .collect()
    }
}

/// Indices by descending score, ties in original order
fn rank_order(scores: &[f64]) -> Vec<usize> {
    let mut indexed: Vec<usize> = (0..scores.len()).collect();
    indexed.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    indexed
}

/// Top-k feature selector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSelector {
    method: SelectionMethod,
    k: usize,
    task: TaskType,
}

impl FeatureSelector {
    /// Create a new feature selector with the given method
    pub fn new(method: SelectionMethod, k: usize) -> Self {
        Self {
            method,
            k,
            task: TaskType::default(),
        }
    }

    pub fn with_task(mut self, task: TaskType) -> Self {
        self.task = task;
        self
    }

    pub fn method(&self) -> SelectionMethod {
        self.method
    }

    pub fn k(&self) -> usize {
        self.k
    }

    fn validate_method(&self) -> Result<()> {
        if self.method == SelectionMethod::Chi2 && self.task == TaskType::Regression {
            return Err(FeatureError::invalid_parameter(
                "method",
                "chi2",
                "chi-squared scoring requires a classification target",
            ));
        }
        Ok(())
    }

    /// Score every column of `x` against `y`
    pub fn score_matrix(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Vec<f64>> {
        self.validate_method()?;

        if x.nrows() != y.len() {
            return Err(FeatureError::ShapeError {
                expected: format!("{} target values", x.nrows()),
                actual: format!("{} target values", y.len()),
            });
        }

        if self.method == SelectionMethod::Chi2 && x.iter().any(|&v| v < 0.0) {
            return Err(FeatureError::invalid_parameter(
                "method",
                "chi2",
                "chi-squared scoring requires non-negative features",
            ));
        }

        let classification = self.task == TaskType::Classification;
        let scores = x
            .columns()
            .into_iter()
            .map(|col| {
                let raw = match (self.method, classification) {
                    (SelectionMethod::MutualInfo, discrete) => scores::mutual_information(col, y.view(), discrete),
                    (SelectionMethod::FTest, true) => scores::anova_f(col, y.view()),
                    (SelectionMethod::FTest, false) => scores::f_regression(col, y.view()),
                    (SelectionMethod::Chi2, _) => scores::chi2(col, y.view()),
                    (SelectionMethod::Correlation, _) => scores::correlation(col, y.view()).abs(),
                };
                scores::sanitize(raw)
            })
            .collect();

        Ok(scores)
    }

    /// Score every non-target column of `df`, in table order
    pub fn score_frame(&self, df: &DataFrame, target: &str) -> Result<Vec<(String, f64)>> {
        self.validate_method()?;

        if df.column(target).is_err() {
            return Err(FeatureError::TargetNotFound(target.to_string()));
        }

        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .filter(|n| n.as_str() != target)
            .map(|n| n.to_string())
            .collect();

        let features = encode_features(df, &names)?;
        let y = encode_target(df, target, self.task)?;
        let scores = self.score_matrix(&features.values, &y)?;

        Ok(names.into_iter().zip(scores).collect())
    }

    /// Score `df` and choose the k best non-target columns
    pub fn fit(&self, df: &DataFrame, target: &str) -> Result<SelectionReport> {
        if self.k == 0 {
            return Err(FeatureError::invalid_parameter(
                "k",
                self.k,
                "at least one feature must be selected",
            ));
        }

        let scores = self.score_frame(df, target)?;
        let values: Vec<f64> = scores.iter().map(|(_, s)| *s).collect();

        let mut keep: Vec<usize> = rank_order(&values).into_iter().take(self.k).collect();
        keep.sort_unstable();
        let selected: Vec<String> = keep.iter().map(|&i| scores[i].0.clone()).collect();

        tracing::info!(
            method = ?self.method,
            task = ?self.task,
            candidates = scores.len(),
            selected = selected.len(),
            "Selected features"
        );

        Ok(SelectionReport {
            method: self.method,
            task: self.task,
            target: target.to_string(),
            scores,
            selected,
        })
    }

    /// Keep the k best non-target columns and the target
    pub fn select(&self, df: &DataFrame, target: &str) -> Result<DataFrame> {
        self.fit(df, target)?.apply(df)
    }
}
