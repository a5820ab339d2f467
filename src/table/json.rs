//! Build tables from loosely-typed JSON values

use crate::error::{FeatureError, Result};
use polars::prelude::*;
use serde_json::{Map, Value};

/// Inferred kind of a JSON column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsonKind {
    Null,
    Integer,
    Float,
    Boolean,
    Text,
}

impl JsonKind {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(JsonKind::Null),
            Value::Bool(_) => Some(JsonKind::Boolean),
            Value::Number(n) if n.is_i64() => Some(JsonKind::Integer),
            Value::Number(_) => Some(JsonKind::Float),
            Value::String(_) => Some(JsonKind::Text),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    fn merge(self, other: Self) -> Option<Self> {
        use JsonKind::*;
        match (self, other) {
            (a, b) if a == b => Some(a),
            (Null, k) | (k, Null) => Some(k),
            (Integer, Float) | (Float, Integer) => Some(Float),
            _ => None,
        }
    }
}

/// Convert a JSON value into a table.
///
/// Accepts an object of equal-length arrays (column-oriented) or an array of
/// objects (records). Every column must hold a single scalar kind; integers
/// and floats mix into Float64 and `null` is a missing value. Anything else
/// fails with [`FeatureError::InputType`].
pub fn frame_from_json(value: &Value) -> Result<DataFrame> {
    let columns = match value {
        Value::Object(map) => columns_from_object(map)?,
        Value::Array(rows) => columns_from_records(rows)?,
        other => {
            return Err(FeatureError::InputType(format!(
                "expected an object of columns or an array of records, got {}",
                json_type_name(other)
            )))
        }
    };

    let columns = columns
        .into_iter()
        .map(|(name, values)| build_column(&name, &values))
        .collect::<Result<Vec<Column>>>()?;

    Ok(DataFrame::new(columns)?)
}

fn columns_from_object(map: &Map<String, Value>) -> Result<Vec<(String, Vec<Value>)>> {
    let mut columns = Vec::with_capacity(map.len());
    let mut height: Option<usize> = None;

    for (name, values) in map {
        let values = values.as_array().ok_or_else(|| {
            FeatureError::InputType(format!(
                "column '{}' is {}, expected an array",
                name,
                json_type_name(values)
            ))
        })?;

        match height {
            Some(h) if h != values.len() => {
                return Err(FeatureError::InputType(format!(
                    "column '{}' has {} values, expected {}",
                    name,
                    values.len(),
                    h
                )))
            }
            _ => height = Some(values.len()),
        }

        columns.push((name.clone(), values.clone()));
    }

    Ok(columns)
}

fn columns_from_records(rows: &[Value]) -> Result<Vec<(String, Vec<Value>)>> {
    let mut names: Vec<String> = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let record = row.as_object().ok_or_else(|| {
            FeatureError::InputType(format!(
                "record {} is {}, expected an object",
                i,
                json_type_name(row)
            ))
        })?;
        for key in record.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    // Keys absent from a record are missing values
    let columns = names
        .into_iter()
        .map(|name| {
            let values = rows
                .iter()
                .map(|row| row.get(&name).cloned().unwrap_or(Value::Null))
                .collect();
            (name, values)
        })
        .collect();

    Ok(columns)
}

fn build_column(name: &str, values: &[Value]) -> Result<Column> {
    let mut kind = JsonKind::Null;
    for value in values {
        let value_kind = JsonKind::of(value).ok_or_else(|| {
            FeatureError::InputType(format!("column '{}' contains a nested value", name))
        })?;
        kind = kind.merge(value_kind).ok_or_else(|| {
            FeatureError::InputType(format!("column '{}' mixes value kinds", name))
        })?;
    }

    let column = match kind {
        JsonKind::Integer => {
            let data: Vec<Option<i64>> = values.iter().map(Value::as_i64).collect();
            Column::new(name.into(), data)
        }
        JsonKind::Float | JsonKind::Null => {
            let data: Vec<Option<f64>> = values.iter().map(Value::as_f64).collect();
            Column::new(name.into(), data)
        }
        JsonKind::Boolean => {
            let data: Vec<Option<bool>> = values.iter().map(Value::as_bool).collect();
            Column::new(name.into(), data)
        }
        JsonKind::Text => {
            let data: Vec<Option<&str>> = values.iter().map(Value::as_str).collect();
            Column::new(name.into(), data)
        }
    };

    Ok(column)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column_names(df: &DataFrame) -> Vec<&str> {
        df.get_columns().iter().map(|c| c.name().as_str()).collect()
    }

    #[test]
    fn test_column_oriented() {
        let df = frame_from_json(&json!({
            "age": [25, 30, 35],
            "income": [1.5, 2, null],
            "city": ["a", "b", "c"],
        }))
        .unwrap();

        assert_eq!(df.shape(), (3, 3));
        assert_eq!(column_names(&df), vec!["age", "income", "city"]);
        assert_eq!(df.column("age").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("income").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("income").unwrap().null_count(), 1);
        assert_eq!(df.column("city").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_column_order_preserved() {
        let df = frame_from_json(&json!({
            "zeta": [1, 2],
            "alpha": [3, 4],
            "mid": [5, 6],
        }))
        .unwrap();
        assert_eq!(column_names(&df), vec!["zeta", "alpha", "mid"]);

        let records = frame_from_json(&json!([
            {"zeta": 1, "alpha": 3},
            {"zeta": 2, "alpha": 4, "mid": 6},
        ]))
        .unwrap();
        assert_eq!(column_names(&records), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_records() {
        let df = frame_from_json(&json!([
            {"a": 1, "flag": true},
            {"a": 2},
        ]))
        .unwrap();

        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.column("flag").unwrap().dtype(), &DataType::Boolean);
        assert_eq!(df.column("flag").unwrap().null_count(), 1);
    }

    #[test]
    fn test_rejects_non_tables() {
        for value in [
            json!("not a dataframe"),
            json!(42),
            json!({"a": 1}),
            json!({"a": [1, 2], "b": [1]}),
            json!({"a": [1, "x"]}),
            json!({"a": [[1]]}),
            json!([1, 2, 3]),
        ] {
            assert!(
                matches!(frame_from_json(&value), Err(FeatureError::InputType(_))),
                "accepted {}",
                value
            );
        }
    }
}
