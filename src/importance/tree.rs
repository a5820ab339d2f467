//! CART tree grown on a row subset, tracking impurity decrease per feature

use ndarray::{Array1, Array2};
use rand::seq::index;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Impurity criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum Criterion {
    /// Gini impurity over class codes `0..n_classes`
    Gini { n_classes: usize },
    /// Mean squared error (regression)
    Mse,
}

/// Running target statistics of one side of a split
#[derive(Debug, Clone)]
struct SideStats {
    count: usize,
    sum: f64,
    sq_sum: f64,
    class_counts: Vec<usize>,
}

impl SideStats {
    fn new(criterion: Criterion) -> Self {
        let n_classes = match criterion {
            Criterion::Gini { n_classes } => n_classes,
            Criterion::Mse => 0,
        };
        Self {
            count: 0,
            sum: 0.0,
            sq_sum: 0.0,
            class_counts: vec![0; n_classes],
        }
    }

    fn add(&mut self, y: f64) {
        self.count += 1;
        self.sum += y;
        self.sq_sum += y * y;
        if let Some(c) = self.class_counts.get_mut(y as usize) {
            *c += 1;
        }
    }

    fn remove(&mut self, y: f64) {
        self.count -= 1;
        self.sum -= y;
        self.sq_sum -= y * y;
        if let Some(c) = self.class_counts.get_mut(y as usize) {
            *c -= 1;
        }
    }

    fn impurity(&self, criterion: Criterion) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let n = self.count as f64;
        match criterion {
            Criterion::Gini { .. } => {
                1.0 - self
                    .class_counts
                    .iter()
                    .map(|&c| (c as f64 / n).powi(2))
                    .sum::<f64>()
            }
            Criterion::Mse => (self.sq_sum / n - (self.sum / n).powi(2)).max(0.0),
        }
    }
}

/// Best split found on one node
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// CART tree grown only for its feature importances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct DecisionTree {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features sampled at each split; all when unset
    pub max_features: Option<usize>,
    pub criterion: Criterion,
    importances: Vec<f64>,
}

impl DecisionTree {
    pub fn new(criterion: Criterion) -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion,
            importances: Vec::new(),
        }
    }

    /// Grow the tree on `rows` of `x`. Importances are raw, un-normalized
    /// weighted impurity decreases. Nodes are not kept.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, rows: &[usize], rng: &mut ChaCha8Rng) {
        let mut importances = vec![0.0; x.ncols()];
        self.grow(x, y, rows, 0, rng, &mut importances);
        self.importances = importances;
    }

    fn stats_of(&self, y: &Array1<f64>, rows: &[usize]) -> SideStats {
        let mut stats = SideStats::new(self.criterion);
        for &i in rows {
            stats.add(y[i]);
        }
        stats
    }

    fn grow(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rows: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
        importances: &mut [f64],
    ) {
        let n_samples = rows.len();
        let parent_impurity = self.stats_of(y, rows).impurity(self.criterion);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || parent_impurity <= f64::EPSILON;
        if should_stop {
            return;
        }

        let Some(split) = self.find_best_split(x, y, rows, parent_impurity, rng) else {
            return;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&i| x[[i, split.feature_idx]] <= split.threshold);

        importances[split.feature_idx] += n_samples as f64 * split.gain;

        self.grow(x, y, &left_rows, depth + 1, rng, importances);
        self.grow(x, y, &right_rows, depth + 1, rng, importances);
    }

    /// Sweep sorted feature values, moving one row at a time to the left side
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rows: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let n_features = x.ncols();
        let n_try = self.max_features.unwrap_or(n_features).clamp(1, n_features.max(1));
        let mut features = index::sample(rng, n_features, n_try.min(n_features)).into_vec();
        features.sort_unstable();

        let n = rows.len() as f64;
        let mut best: Option<SplitCandidate> = None;

        for feature_idx in features {
            let mut sorted: Vec<usize> = rows.to_vec();
            sorted.sort_by(|&a, &b| x[[a, feature_idx]].total_cmp(&x[[b, feature_idx]]));

            let mut left = SideStats::new(self.criterion);
            let mut right = self.stats_of(y, &sorted);

            for pos in 0..sorted.len() - 1 {
                let row = sorted[pos];
                left.add(y[row]);
                right.remove(y[row]);

                let current = x[[row, feature_idx]];
                let next = x[[sorted[pos + 1], feature_idx]];
                if current == next
                    || left.count < self.min_samples_leaf
                    || right.count < self.min_samples_leaf
                {
                    continue;
                }

                let weighted = (left.count as f64 * left.impurity(self.criterion)
                    + right.count as f64 * right.impurity(self.criterion))
                    / n;
                let gain = parent_impurity - weighted;

                if gain > best.as_ref().map_or(f64::EPSILON, |b| b.gain) {
                    best = Some(SplitCandidate {
                        feature_idx,
                        threshold: (current + next) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }

    /// Raw impurity decrease per feature
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    #[test]
    fn test_classifier_credits_split_feature() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 1.0], [10.0, 1.0], [11.0, 0.0], [12.0, 1.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let rows: Vec<usize> = (0..6).collect();

        let mut tree = DecisionTree::new(Criterion::Gini { n_classes: 2 });
        tree.fit(&x, &y, &rows, &mut ChaCha8Rng::seed_from_u64(42));

        // One split on feature 0 separates the classes: 6 * 0.5
        assert!((tree.importances()[0] - 3.0).abs() < 1e-9);
        assert_eq!(tree.importances()[1], 0.0);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let rows: Vec<usize> = (0..8).collect();

        let mut stump = DecisionTree::new(Criterion::Mse);
        stump.max_depth = Some(0);
        stump.fit(&x, &y, &rows, &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(stump.importances(), &[0.0]);

        let mut shallow = DecisionTree::new(Criterion::Mse);
        shallow.max_depth = Some(1);
        shallow.fit(&x, &y, &rows, &mut ChaCha8Rng::seed_from_u64(0));

        let mut deep = DecisionTree::new(Criterion::Mse);
        deep.fit(&x, &y, &rows, &mut ChaCha8Rng::seed_from_u64(0));

        assert!(shallow.importances()[0] > 0.0);
        assert!(deep.importances()[0] > shallow.importances()[0]);
    }

    #[test]
    fn test_pure_node_not_split() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, 1.0, 1.0];
        let mut tree = DecisionTree::new(Criterion::Gini { n_classes: 2 });
        tree.fit(&x, &y, &[0, 1, 2], &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(tree.importances(), &[0.0]);
    }
}
