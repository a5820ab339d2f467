//! Numeric encoding of table columns for supervised scoring

use super::{column, ColumnKind};
use crate::config::TaskType;
use crate::error::{FeatureError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// Dense row-major feature matrix with its column names
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn n_features(&self) -> usize {
        self.names.len()
    }

    pub fn n_samples(&self) -> usize {
        self.values.nrows()
    }
}

/// Encode the named columns into a feature matrix.
///
/// Numeric columns are cast to f64, booleans become 0/1, text and categorical
/// columns become ordinal codes over their sorted distinct values and
/// datetimes use their physical integer. Missing and non-finite values are 0.
pub fn encode_features(df: &DataFrame, names: &[String]) -> Result<FeatureMatrix> {
    let n_rows = df.height();

    let col_data: Vec<Vec<f64>> = names
        .iter()
        .map(|name| encode_column(df, name))
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    let values = Array2::from_shape_fn((n_rows, names.len()), |(r, c)| col_refs[c][r]);

    Ok(FeatureMatrix {
        names: names.to_vec(),
        values,
    })
}

fn encode_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let col = column(df, name)?;

    let values = match ColumnKind::of(col.dtype()) {
        ColumnKind::Float | ColumnKind::Integer | ColumnKind::Boolean => {
            let casted = col.cast(&DataType::Float64)?;
            casted
                .f64()?
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()).unwrap_or(0.0))
                .collect()
        }
        ColumnKind::DateTime => {
            let casted = col.cast(&DataType::Int64)?;
            casted
                .i64()?
                .into_iter()
                .map(|v| v.map(|x| x as f64).unwrap_or(0.0))
                .collect()
        }
        ColumnKind::Categorical => ordinal_codes(col)?
            .into_iter()
            .map(|code| code.map(|c| c as f64).unwrap_or(0.0))
            .collect(),
        ColumnKind::Other => {
            return Err(FeatureError::TypeMismatch {
                column: name.to_string(),
                expected: "numeric, boolean, text or datetime".to_string(),
                actual: col.dtype().to_string(),
            })
        }
    };

    Ok(values)
}

/// Ordinal code of each value among the sorted distinct values
fn ordinal_codes(col: &Column) -> Result<Vec<Option<usize>>> {
    let casted = col.cast(&DataType::String)?;
    let ca = casted.str()?;

    let mut levels: Vec<&str> = ca.into_iter().flatten().collect();
    levels.sort_unstable();
    levels.dedup();

    Ok(ca
        .into_iter()
        .map(|v| v.and_then(|s| levels.binary_search(&s).ok()))
        .collect())
}

/// Encode the target column.
///
/// Classification targets are label-encoded into `0..n_classes` over their
/// sorted distinct values, with missing values forming a final class.
/// Regression targets must be numeric; missing values become 0.
pub fn encode_target(df: &DataFrame, target: &str, task: TaskType) -> Result<Array1<f64>> {
    let col = column(df, target)?;
    let kind = ColumnKind::of(col.dtype());

    match task {
        TaskType::Regression => {
            if !kind.is_numeric() && kind != ColumnKind::Boolean {
                return Err(FeatureError::TypeMismatch {
                    column: target.to_string(),
                    expected: "numeric target for regression".to_string(),
                    actual: col.dtype().to_string(),
                });
            }
            let casted = col.cast(&DataType::Float64)?;
            Ok(casted
                .f64()?
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()).unwrap_or(0.0))
                .collect())
        }
        TaskType::Classification => {
            let codes: Vec<Option<usize>> = match kind {
                ColumnKind::Float | ColumnKind::Integer | ColumnKind::Boolean => {
                    let casted = col.cast(&DataType::Float64)?;
                    let raw: Vec<Option<f64>> = casted
                        .f64()?
                        .into_iter()
                        .map(|v| v.filter(|x| !x.is_nan()))
                        .collect();
                    let mut levels: Vec<f64> = raw.iter().flatten().copied().collect();
                    levels.sort_by(|a, b| a.total_cmp(b));
                    levels.dedup();
                    raw.into_iter()
                        .map(|v| v.and_then(|x| levels.binary_search_by(|l| l.total_cmp(&x)).ok()))
                        .collect()
                }
                ColumnKind::Categorical => ordinal_codes(col)?,
                _ => {
                    return Err(FeatureError::TypeMismatch {
                        column: target.to_string(),
                        expected: "numeric, boolean or text target".to_string(),
                        actual: col.dtype().to_string(),
                    })
                }
            };

            let missing_class = codes.iter().flatten().max().map_or(0, |m| m + 1);
            Ok(codes
                .into_iter()
                .map(|c| c.unwrap_or(missing_class) as f64)
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_mixed_columns() {
        let df = df!(
            "x" => &[Some(1.0), None, Some(3.0)],
            "flag" => &[true, false, true],
            "city" => &["sf", "la", "sf"],
        )
        .unwrap();

        let names = vec!["x".to_string(), "flag".to_string(), "city".to_string()];
        let matrix = encode_features(&df, &names).unwrap();

        assert_eq!(matrix.values.shape(), &[3, 3]);
        assert_eq!(matrix.values[[1, 0]], 0.0);
        assert_eq!(matrix.values[[0, 1]], 1.0);
        // "la" < "sf"
        assert_eq!(matrix.values[[0, 2]], 1.0);
        assert_eq!(matrix.values[[1, 2]], 0.0);
    }

    #[test]
    fn test_encode_classification_target() {
        let df = df!("y" => &["yes", "no", "yes", "maybe"]).unwrap();
        let y = encode_target(&df, "y", TaskType::Classification).unwrap();
        assert_eq!(y.to_vec(), vec![2.0, 1.0, 2.0, 0.0]);

        let df = df!("y" => &[Some(5i64), None, Some(7)]).unwrap();
        let y = encode_target(&df, "y", TaskType::Classification).unwrap();
        assert_eq!(y.to_vec(), vec![0.0, 2.0, 1.0]);
    }

    #[test]
    fn test_regression_target_must_be_numeric() {
        let df = df!("y" => &["a", "b"]).unwrap();
        assert!(matches!(
            encode_target(&df, "y", TaskType::Regression),
            Err(FeatureError::TypeMismatch { .. })
        ));
    }
}
