//! Model-based feature importance
//!
//! Fits a random forest on every non-target column and reports the mean
//! impurity decrease attributed to each one.

mod tree;

use crate::config::TaskType;
use crate::error::{FeatureError, Result};
use crate::table::{encode_features, encode_target};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tree::{Criterion, DecisionTree};

/// Importance score per feature, in table order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureImportances {
    pub scores: Vec<(String, f64)>,
}

impl FeatureImportances {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.scores.iter().find(|(n, _)| n == name).map(|(_, s)| *s)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Most important first, ties in table order
    pub fn sorted(&self) -> Vec<(String, f64)> {
        let mut sorted = self.scores.clone();
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
        sorted
    }

    pub fn into_map(self) -> HashMap<String, f64> {
        self.scores.into_iter().collect()
    }
}

/// Random-forest importance ranker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub task: TaskType,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth of each tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random state
    pub random_state: u64,
}

impl Default for FeatureImportance {
    fn default() -> Self {
        Self::new(TaskType::default())
    }
}

impl FeatureImportance {
    pub fn new(task: TaskType) -> Self {
        Self {
            task,
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            random_state: 42,
        }
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Features considered at each split
    fn max_features(n_features: usize) -> usize {
        ((n_features as f64).sqrt().ceil() as usize).max(1)
    }

    /// Normalized importances of the columns of `x` for target `y`
    pub fn fit_matrix(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Vec<f64>> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(FeatureError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        if self.n_estimators == 0 {
            return Err(FeatureError::invalid_parameter(
                "n_estimators",
                self.n_estimators,
                "at least one tree is required",
            ));
        }

        if n_features == 0 || n_samples == 0 {
            return Ok(vec![0.0; n_features]);
        }

        let criterion = match self.task {
            TaskType::Classification => Criterion::Gini {
                n_classes: y.iter().fold(0.0f64, |m, &v| m.max(v)) as usize + 1,
            },
            TaskType::Regression => Criterion::Mse,
        };
        let max_features = Self::max_features(n_features);

        let per_tree: Vec<Vec<f64>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = self.random_state.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let rows: Vec<usize> = if self.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut tree = DecisionTree::new(criterion);
                tree.max_depth = self.max_depth;
                tree.min_samples_split = self.min_samples_split;
                tree.min_samples_leaf = self.min_samples_leaf;
                tree.max_features = Some(max_features);
                tree.fit(x, y, &rows, &mut rng);

                normalized(tree.importances().to_vec())
            })
            .collect();

        let mut total = vec![0.0; n_features];
        for importances in &per_tree {
            for (t, v) in total.iter_mut().zip(importances) {
                *t += v;
            }
        }

        Ok(normalized(total))
    }

    /// Importance of every non-target column of `df`
    pub fn compute(&self, df: &polars::prelude::DataFrame, target: &str) -> Result<FeatureImportances> {
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
        let scores = self.fit_matrix(&features.values, &y)?;

        tracing::info!(
            task = ?self.task,
            n_estimators = self.n_estimators,
            n_features = names.len(),
            "Computed feature importances"
        );

        Ok(FeatureImportances {
            scores: names.into_iter().zip(scores).collect(),
        })
    }
}

/// Scale to sum to one; all-zero input stays zero
fn normalized(mut values: Vec<f64>) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        for v in &mut values {
            *v /= total;
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use polars::prelude::*;
    use rand::Rng;

    fn synthetic(n: usize) -> (Array2<f64>, Array1<f64>) {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let x = Array2::from_shape_fn((n, 3), |_| rng.gen_range(0.0..1.0));
        let y = x.column(1).mapv(|v| if v > 0.5 { 1.0 } else { 0.0 });
        (x, y)
    }

    #[test]
    fn test_informative_feature_ranks_first() {
        let (x, y) = synthetic(120);
        let scores = FeatureImportance::new(TaskType::Classification)
            .with_n_estimators(20)
            .fit_matrix(&x, &y)
            .unwrap();

        assert_eq!(scores.len(), 3);
        assert!(scores.iter().all(|&s| s >= 0.0));
        assert!((scores.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(scores[1] > scores[0] && scores[1] > scores[2]);
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let (x, y) = synthetic(60);
        let ranker = FeatureImportance::new(TaskType::Classification).with_n_estimators(10);
        assert_eq!(ranker.fit_matrix(&x, &y).unwrap(), ranker.fit_matrix(&x, &y).unwrap());
    }

    #[test]
    fn test_regression_importance() {
        let df = df!(
            "x" => &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
            "flat" => &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            "y" => &[1.0, 4.0, 9.0, 16.0, 25.0, 36.0, 49.0, 64.0],
        )
        .unwrap();

        let importances = FeatureImportance::new(TaskType::Regression)
            .with_n_estimators(10)
            .compute(&df, "y")
            .unwrap();
        assert_eq!(importances.len(), 2);
        assert_eq!(importances.get("flat"), Some(0.0));
        assert!(importances.get("x").unwrap() > 0.99);
        assert_eq!(importances.sorted()[0].0, "x");
    }

    #[test]
    fn test_constant_target_gives_zeros() {
        let df = df!("a" => &[1.0, 2.0, 3.0], "y" => &[1i64, 1, 1]).unwrap();
        let importances = FeatureImportance::default().compute(&df, "y").unwrap();
        assert_eq!(importances.get("a"), Some(0.0));
    }
}
