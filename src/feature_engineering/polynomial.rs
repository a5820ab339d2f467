//! Polynomial feature generation

use super::{describe_columns, to_names, unique_columns, FeatureGenerator};
use crate::error::{FeatureError, Result};
use crate::table::{self, NameRegistry};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Polynomial feature generator.
///
/// Emits every monomial of total degree `2..=degree` over the numeric
/// columns among `columns`. Source columns are kept, so degree-1 terms are not
/// repeated. Non-numeric columns are skipped; columns that do not exist are
/// an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolynomialFeatures {
    columns: Vec<String>,
    /// Maximum polynomial degree
    degree: usize,
    /// Drop terms with a repeated factor (no x^2 and friends)
    interaction_only: bool,
}

impl PolynomialFeatures {
    /// Degree-2 polynomial terms over `columns`
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: to_names(columns),
            degree: 2,
            interaction_only: false,
        }
    }

    /// Set maximum degree
    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    /// Set interaction only mode
    pub fn interaction_only(mut self, only: bool) -> Self {
        self.interaction_only = only;
        self
    }

    /// Generate all combinations of feature indices of degree 2..=degree
    fn generate_combinations(&self, n_features: usize) -> Vec<Vec<usize>> {
        let mut combinations = Vec::new();
        for d in 2..=self.degree {
            self.generate_combinations_recursive(n_features, d, 0, &mut Vec::new(), &mut combinations);
        }
        combinations
    }

    fn generate_combinations_recursive(
        &self,
        n_features: usize,
        remaining_degree: usize,
        start_idx: usize,
        current: &mut Vec<usize>,
        result: &mut Vec<Vec<usize>>,
    ) {
        if remaining_degree == 0 {
            result.push(current.clone());
            return;
        }

        for i in start_idx..n_features {
            current.push(i);
            // Same index again allows powers; skip it for interaction-only
            let next = if self.interaction_only { i + 1 } else { i };
            self.generate_combinations_recursive(n_features, remaining_degree - 1, next, current, result);
            current.pop();
        }
    }

    /// `poly_a_pow2_x_b` for the combination [a, a, b]
    fn combination_name(names: &[String], combination: &[usize]) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut i = 0;
        while i < combination.len() {
            let idx = combination[i];
            let power = combination[i..].iter().take_while(|&&j| j == idx).count();
            parts.push(if power == 1 {
                names[idx].clone()
            } else {
                format!("{}_pow{}", names[idx], power)
            });
            i += power;
        }
        format!("poly_{}", parts.join("_x_"))
    }
}

impl FeatureGenerator for PolynomialFeatures {
    fn kind(&self) -> &'static str {
        "polynomial"
    }

    fn generate(&self, df: &DataFrame) -> Result<DataFrame> {
        if self.degree < 2 {
            return Err(FeatureError::invalid_parameter(
                "degree",
                self.degree,
                "polynomial degree must be at least 2",
            ));
        }

        let requested = unique_columns(&self.columns);
        table::ensure_columns_exist(df, &requested)?;

        let mut numeric = Vec::with_capacity(requested.len());
        for name in &requested {
            match table::kind_of(df, name)? {
                kind if kind.is_numeric() => numeric.push(name.clone()),
                kind => tracing::debug!(column = %name, kind = ?kind, "Skipping non-numeric column for polynomial features"),
            }
        }

        if numeric.is_empty() {
            return Err(FeatureError::NoNumericColumns(describe_columns(&requested)));
        }

        let values: Vec<Vec<Option<f64>>> = numeric
            .iter()
            .map(|name| table::numeric_values(df, name))
            .collect::<Result<_>>()?;

        let mut names = NameRegistry::for_frame(df);
        let derived: Vec<Column> = self
            .generate_combinations(numeric.len())
            .iter()
            .map(|combination| {
                let data: Vec<Option<f64>> = (0..df.height())
                    .map(|row| {
                        combination
                            .iter()
                            .map(|&c| values[c][row])
                            .try_fold(1.0, |acc, v| v.map(|x| acc * x))
                    })
                    .collect();
                let name = names.claim(Self::combination_name(&numeric, combination));
                Column::new(name.into(), data)
            })
            .collect();

        tracing::debug!(
            columns = %describe_columns(&numeric),
            degree = self.degree,
            added = derived.len(),
            "Generated polynomial features"
        );

        table::extend_frame(df, derived)
    }
}
