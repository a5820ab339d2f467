//! Binning / discretization of numeric columns

use super::{describe_columns, to_names, unique_columns, FeatureGenerator};
use crate::error::{FeatureError, Result};
use crate::table::{self, NameRegistry};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Suffix of every binned column, `{col}_binned`
pub const BINNED_SUFFIX: &str = "_binned";

const KMEANS_MAX_ITER: usize = 50;
const KMEANS_TOL: f64 = 1e-6;

/// Strategy for creating bins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BinningStrategy {
    /// Equal-width bins
    #[default]
    Uniform,
    /// Equal-frequency bins (quantiles)
    Quantile,
    /// One-dimensional k-means clusters
    KMeans,
}

/// What happens to the source column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BinningMode {
    /// Keep the source and append `{col}_binned`
    #[default]
    Add,
    /// `{col}_binned` takes the source column's position
    Replace,
}

/// Discretize numeric columns into at most `n_bins` ordinal bins.
///
/// Bin indices are Int64 in `[0, n_bins)`. Duplicate cut points are merged, so
/// skewed or constant columns may use fewer bins than requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinnedFeatures {
    columns: Vec<String>,
    n_bins: usize,
    strategy: BinningStrategy,
    mode: BinningMode,
}

impl BinnedFeatures {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>, n_bins: usize) -> Self {
        Self {
            columns: to_names(columns),
            n_bins,
            strategy: BinningStrategy::default(),
            mode: BinningMode::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: BinningStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_mode(mut self, mode: BinningMode) -> Self {
        self.mode = mode;
        self
    }

    /// Interior cut points for the present values of a column, sorted ascending
    fn compute_cut_points(&self, values: &mut [f64]) -> Vec<f64> {
        values.sort_by(|a, b| a.total_cmp(b));

        let min_val = values[0];
        let max_val = values[values.len() - 1];

        let mut cuts: Vec<f64> = match self.strategy {
            BinningStrategy::Uniform => {
                let step = (max_val - min_val) / self.n_bins as f64;
                (1..self.n_bins).map(|i| min_val + i as f64 * step).collect()
            }
            BinningStrategy::Quantile => (1..self.n_bins)
                .map(|i| {
                    let q = i as f64 / self.n_bins as f64;
                    let idx = (q * (values.len() - 1) as f64) as usize;
                    values[idx]
                })
                .collect(),
            BinningStrategy::KMeans => {
                let centroids = self.kmeans_centroids(values, min_val, max_val);
                centroids.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
            }
        };

        cuts.dedup();
        cuts
    }

    /// Sorted, de-duplicated cluster centers of sorted `values`
    fn kmeans_centroids(&self, values: &[f64], min_val: f64, max_val: f64) -> Vec<f64> {
        let step = (max_val - min_val) / self.n_bins as f64;
        let mut centroids: Vec<f64> = (0..self.n_bins)
            .map(|i| min_val + (i as f64 + 0.5) * step)
            .collect();

        for _ in 0..KMEANS_MAX_ITER {
            let mut sums = vec![0.0; centroids.len()];
            let mut counts = vec![0usize; centroids.len()];

            for &v in values {
                let nearest = nearest_centroid(v, &centroids);
                sums[nearest] += v;
                counts[nearest] += 1;
            }

            let mut converged = true;
            for (i, centroid) in centroids.iter_mut().enumerate() {
                if counts[i] > 0 {
                    let updated = sums[i] / counts[i] as f64;
                    if (updated - *centroid).abs() > KMEANS_TOL {
                        converged = false;
                    }
                    *centroid = updated;
                }
            }

            if converged {
                break;
            }
        }

        // Empty clusters keep their seed position and would split nothing
        let mut counts = vec![0usize; centroids.len()];
        for &v in values {
            counts[nearest_centroid(v, &centroids)] += 1;
        }
        let mut centroids: Vec<f64> = centroids
            .into_iter()
            .zip(counts)
            .filter(|(_, n)| *n > 0)
            .map(|(c, _)| c)
            .collect();
        centroids.sort_by(|a, b| a.total_cmp(b));
        centroids.dedup_by(|a, b| (*a - *b).abs() <= KMEANS_TOL);
        centroids
    }

    fn bin_column(&self, df: &DataFrame, name: &str, registry: &mut NameRegistry) -> Result<Column> {
        let raw = table::numeric_values(df, name)?;
        let mut present: Vec<f64> = raw.iter().flatten().copied().collect();

        let binned: Vec<Option<i64>> = if present.is_empty() {
            tracing::warn!(column = %name, "Column has no values to bin");
            vec![None; raw.len()]
        } else {
            let cuts = self.compute_cut_points(&mut present);
            raw.iter()
                .map(|v| v.map(|x| find_bin(x, &cuts, self.n_bins) as i64))
                .collect()
        };

        let out_name = registry.claim(format!("{}{}", name, BINNED_SUFFIX));
        Ok(Column::new(out_name.into(), binned))
    }
}

/// Index of the nearest centroid, lowest index on ties
fn nearest_centroid(value: f64, centroids: &[f64]) -> usize {
    centroids
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (value - **a).abs().total_cmp(&(value - **b).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Number of cut points strictly below `value`, capped at the last bin
fn find_bin(value: f64, cuts: &[f64], n_bins: usize) -> usize {
    cuts.partition_point(|&c| c < value).min(n_bins - 1)
}

impl FeatureGenerator for BinnedFeatures {
    fn kind(&self) -> &'static str {
        "binning"
    }

    fn generate(&self, df: &DataFrame) -> Result<DataFrame> {
        if self.n_bins < 2 {
            return Err(FeatureError::invalid_parameter(
                "n_bins",
                self.n_bins,
                "at least 2 bins are required",
            ));
        }

        let names = unique_columns(&self.columns);
        if names.is_empty() {
            return Err(FeatureError::invalid_parameter(
                "columns",
                "",
                "at least one column is required",
            ));
        }
        table::ensure_columns_exist(df, &names)?;

        let mut registry = NameRegistry::for_frame(df);
        let mut binned: HashMap<String, Column> = HashMap::with_capacity(names.len());
        let mut ordered = Vec::with_capacity(names.len());
        for name in &names {
            let column = self.bin_column(df, name, &mut registry)?;
            match self.mode {
                BinningMode::Add => ordered.push(column),
                BinningMode::Replace => {
                    binned.insert(name.clone(), column);
                }
            }
        }

        tracing::debug!(
            columns = %describe_columns(&names),
            n_bins = self.n_bins,
            strategy = ?self.strategy,
            mode = ?self.mode,
            "Generated binned features"
        );

        match self.mode {
            BinningMode::Add => table::extend_frame(df, ordered),
            BinningMode::Replace => {
                let columns: Vec<Column> = df
                    .get_columns()
                    .iter()
                    .map(|c| binned.remove(c.name().as_str()).unwrap_or_else(|| c.clone()))
                    .collect();
                Ok(DataFrame::new(columns)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ages() -> DataFrame {
        df!(
            "age" => &[18.0, 22.0, 25.0, 31.0, 38.0, 45.0, 52.0, 60.0, 67.0, 75.0],
            "name" => &["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"],
        )
        .unwrap()
    }

    fn n_unique(df: &DataFrame, name: &str) -> usize {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .n_unique()
            .unwrap()
    }

    #[test]
    fn test_uniform_binning() {
        let result = BinnedFeatures::new(["age"], 3).generate(&ages()).unwrap();

        let binned = result.column("age_binned").unwrap();
        assert_eq!(binned.dtype(), &DataType::Int64);
        let bins: Vec<i64> = binned.i64().unwrap().into_iter().flatten().collect();
        assert_eq!(bins[0], 0);
        assert_eq!(bins[9], 2);
        assert!(bins.iter().all(|&b| (0..3).contains(&b)));
        assert!(result.column("age").is_ok());
    }

    #[test]
    fn test_every_strategy_respects_n_bins() {
        for strategy in [BinningStrategy::Uniform, BinningStrategy::Quantile, BinningStrategy::KMeans] {
            let result = BinnedFeatures::new(["age"], 4)
                .with_strategy(strategy)
                .generate(&ages())
                .unwrap();
            let distinct = n_unique(&result, "age_binned");
            assert!(distinct <= 4, "{:?} produced {} bins", strategy, distinct);
            assert!(distinct >= 2, "{:?} collapsed to {} bins", strategy, distinct);
        }
    }

    #[test]
    fn test_quantile_bins_are_balanced() {
        let result = BinnedFeatures::new(["age"], 2)
            .with_strategy(BinningStrategy::Quantile)
            .generate(&ages())
            .unwrap();
        let bins = result.column("age_binned").unwrap();
        let ones = bins.i64().unwrap().into_iter().filter(|b| *b == Some(1)).count();
        assert_eq!(ones, 5);
    }

    #[test]
    fn test_kmeans_separates_clusters() {
        let df = df!("x" => &[1.0, 1.1, 0.9, 10.0, 10.2, 9.8]).unwrap();
        let result = BinnedFeatures::new(["x"], 2)
            .with_strategy(BinningStrategy::KMeans)
            .generate(&df)
            .unwrap();
        let bins: Vec<i64> = result.column("x_binned").unwrap().i64().unwrap().into_iter().flatten().collect();
        assert_eq!(bins, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_constant_and_missing_columns() {
        let df = df!(
            "c" => &[5.0, 5.0, 5.0],
            "m" => &[None::<f64>, None, None],
            "p" => &[Some(1.0), None, Some(3.0)],
        )
        .unwrap();

        let result = BinnedFeatures::new(["c", "m", "p"], 3).generate(&df).unwrap();
        let constant: Vec<Option<i64>> = result.column("c_binned").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(constant, vec![Some(0), Some(0), Some(0)]);
        assert_eq!(result.column("m_binned").unwrap().null_count(), 3);
        assert_eq!(result.column("p_binned").unwrap().null_count(), 1);
    }

    #[test]
    fn test_replace_mode_keeps_position() {
        let df = df!(
            "a" => &[1.0, 2.0, 3.0],
            "b" => &[3.0, 2.0, 1.0],
            "c" => &[0.0, 0.0, 0.0],
        )
        .unwrap();

        let result = BinnedFeatures::new(["b"], 2)
            .with_mode(BinningMode::Replace)
            .generate(&df)
            .unwrap();
        let names: Vec<String> = result.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["a", "b_binned", "c"]);
    }

    #[test]
    fn test_invalid_binning() {
        let df = ages();
        assert!(matches!(
            BinnedFeatures::new(["age"], 1).generate(&df),
            Err(FeatureError::InvalidParameter { .. })
        ));
        assert!(matches!(
            BinnedFeatures::new(["name"], 3).generate(&df),
            Err(FeatureError::TypeMismatch { .. })
        ));
        assert!(matches!(
            BinnedFeatures::new(["height"], 3).generate(&df),
            Err(FeatureError::ColumnNotFound(_))
        ));
    }
}
