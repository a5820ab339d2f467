//! Ratio feature generation

use super::{describe_columns, numeric_inputs, to_names, FeatureGenerator};
use crate::error::Result;
use crate::table::{self, NameRegistry};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Infix between numerator and denominator, `{num}_div_{den}`
pub const RATIO_INFIX: &str = "_div_";

/// Value produced for a zero denominator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroDivision {
    /// `x / 0 = 0`
    #[default]
    Zero,
    /// `x / 0 = ±inf` by the sign of `x`, `0 / 0 = 0`
    SignedInfinity,
}

impl ZeroDivision {
    /// Divide under this policy. Never returns NaN for finite inputs.
    pub fn divide(self, numerator: f64, denominator: f64) -> f64 {
        if denominator != 0.0 {
            return numerator / denominator;
        }
        match self {
            ZeroDivision::Zero => 0.0,
            ZeroDivision::SignedInfinity if numerator > 0.0 => f64::INFINITY,
            ZeroDivision::SignedInfinity if numerator < 0.0 => f64::NEG_INFINITY,
            ZeroDivision::SignedInfinity => 0.0,
        }
    }
}

/// Ratio generator over ordered column pairs.
///
/// Each unordered pair `(i, j)`, `i < j`, yields `a_div_b` then `b_div_a`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioFeatures {
    columns: Vec<String>,
    max_ratios: Option<usize>,
    zero_division: ZeroDivision,
}

impl RatioFeatures {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: to_names(columns),
            max_ratios: None,
            zero_division: ZeroDivision::default(),
        }
    }

    /// Cap the number of generated columns
    pub fn with_max_ratios(mut self, max: Option<usize>) -> Self {
        self.max_ratios = max;
        self
    }

    pub fn with_zero_division(mut self, policy: ZeroDivision) -> Self {
        self.zero_division = policy;
        self
    }
}

impl FeatureGenerator for RatioFeatures {
    fn kind(&self) -> &'static str {
        "ratios"
    }

    fn generate(&self, df: &DataFrame) -> Result<DataFrame> {
        let (names, values) = numeric_inputs(df, &self.columns, 2)?;
        let limit = self.max_ratios.unwrap_or(usize::MAX);

        let ordered = table::unordered_pairs(names.len())
            .into_iter()
            .flat_map(|(i, j)| [(i, j), (j, i)])
            .take(limit);

        let mut registry = NameRegistry::for_frame(df);
        let mut zero_denominators = 0usize;
        let derived: Vec<Column> = ordered
            .map(|(num, den)| {
                let data: Vec<Option<f64>> = values[num]
                    .iter()
                    .zip(&values[den])
                    .map(|(n, d)| {
                        let (n, d) = ((*n)?, (*d)?);
                        if d == 0.0 {
                            zero_denominators += 1;
                        }
                        Some(self.zero_division.divide(n, d))
                    })
                    .collect();
                let name = registry.claim(format!("{}{}{}", names[num], RATIO_INFIX, names[den]));
                Column::new(name.into(), data)
            })
            .collect();

        tracing::debug!(
            columns = %describe_columns(&names),
            added = derived.len(),
            zero_denominators,
            policy = ?self.zero_division,
            "Generated ratio features"
        );

        table::extend_frame(df, derived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeatureError;

    #[test]
    fn test_zero_division_policy() {
        assert_eq!(ZeroDivision::Zero.divide(5.0, 0.0), 0.0);
        assert_eq!(ZeroDivision::Zero.divide(6.0, 3.0), 2.0);
        assert_eq!(ZeroDivision::SignedInfinity.divide(5.0, 0.0), f64::INFINITY);
        assert_eq!(ZeroDivision::SignedInfinity.divide(-5.0, 0.0), f64::NEG_INFINITY);
        assert_eq!(ZeroDivision::SignedInfinity.divide(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_ratio_pairs_both_directions() {
        let df = df!(
            "a" => &[1.0, 2.0],
            "b" => &[2.0, 4.0],
            "c" => &[4.0, 8.0],
        )
        .unwrap();

        let result = RatioFeatures::new(["a", "b", "c"]).generate(&df).unwrap();
        let names: Vec<String> = result
            .get_column_names()
            .iter()
            .skip(3)
            .map(|n| n.to_string())
            .collect();
        assert_eq!(
            names,
            vec!["a_div_b", "b_div_a", "a_div_c", "c_div_a", "b_div_c", "c_div_b"]
        );
        assert_eq!(result.column("b_div_a").unwrap().f64().unwrap().get(0), Some(2.0));

        let capped = RatioFeatures::new(["a", "b", "c"])
            .with_max_ratios(Some(3))
            .generate(&df)
            .unwrap();
        assert_eq!(capped.width(), 6);
        assert!(capped.column("a_div_c").is_ok());
        assert!(capped.column("c_div_a").is_err());
    }

    #[test]
    fn test_zero_denominator_never_all_missing() {
        let df = df!(
            "a" => &[1.0, 2.0, 3.0],
            "b" => &[0.0, 0.0, 0.0],
        )
        .unwrap();

        let result = RatioFeatures::new(["a", "b"]).generate(&df).unwrap();
        let ratio = result.column("a_div_b").unwrap();
        assert_eq!(ratio.null_count(), 0);
        assert!(ratio.f64().unwrap().into_iter().all(|v| v == Some(0.0)));
    }

    #[test]
    fn test_missing_inputs_stay_missing() {
        let df = df!(
            "a" => &[Some(1.0), None],
            "b" => &[Some(2.0), Some(3.0)],
        )
        .unwrap();

        let result = RatioFeatures::new(["a", "b"]).generate(&df).unwrap();
        let ratio = result.column("b_div_a").unwrap().f64().unwrap();
        assert_eq!(ratio.get(0), Some(2.0));
        assert_eq!(ratio.get(1), None);
    }

    #[test]
    fn test_needs_two_numeric_columns() {
        let df = df!("a" => &[1.0], "s" => &["x"]).unwrap();
        assert!(matches!(
            RatioFeatures::new(["a"]).generate(&df),
            Err(FeatureError::InvalidParameter { .. })
        ));
        assert!(matches!(
            RatioFeatures::new(["a", "s"]).generate(&df),
            Err(FeatureError::TypeMismatch { .. })
        ));
    }
}
