//! Error types for the feature engine

use thiserror::Error;

/// Result type alias for feature engine operations
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Main error type for the feature engine
#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Input is not table-shaped: {0}")]
    InputType(String),

    #[error("Empty input: {rows} rows, {columns} columns")]
    EmptyInput { rows: usize, columns: usize },

    #[error("Target column not found: {0}")]
    TargetNotFound(String),

    #[error("Target column required for {0}")]
    TargetRequired(&'static str),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column '{column}' has type {actual}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("No numeric columns among: {0}")]
    NoNumericColumns(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl FeatureError {
    /// Shorthand for [`FeatureError::InvalidParameter`]
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        FeatureError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Errors caused by how the engine was called rather than by the data
    /// backend. These are never worth retrying.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            FeatureError::InputType(_)
                | FeatureError::EmptyInput { .. }
                | FeatureError::TargetNotFound(_)
                | FeatureError::TargetRequired(_)
                | FeatureError::ColumnNotFound(_)
                | FeatureError::TypeMismatch { .. }
                | FeatureError::NoNumericColumns(_)
                | FeatureError::InvalidParameter { .. }
        )
    }
}

impl From<polars::error::PolarsError> for FeatureError {
    fn from(err: polars::error::PolarsError) -> Self {
        FeatureError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for FeatureError {
    fn from(err: serde_json::Error) -> Self {
        FeatureError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for FeatureError {
    fn from(err: ndarray::ShapeError) -> Self {
        FeatureError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
