//! AutoPrep Features - automated feature engineering for tabular data
//!
//! This crate expands a table with derived columns, then narrows it back down
//! with supervised selection and model-based importance:
//! - Polynomial, interaction, ratio, binned, aggregate and datetime features
//! - Top-k selection by mutual information, F-test, chi-squared or correlation
//! - Random-forest feature importance
//! - A one-call pipeline, [`auto_feature_engineering`]
//!
//! # Modules
//!
//! - [`engine`] - Validated table plus target, the main entry point
//! - [`feature_engineering`] - Feature generators
//! - [`selection`] - Supervised top-k selection
//! - [`importance`] - Random-forest importance ranking
//! - [`auto`] - Fixed generation sequence with optional selection
//! - [`table`] - Column kinds, encoding, JSON ingestion
//! - [`suggest`] - Prompting an external LLM for feature ideas
//! - [`config`] - Pipeline configuration and task types

// Core error handling
pub mod error;
pub mod config;

// Data handling
pub mod table;

// Feature engineering
pub mod feature_engineering;
pub mod selection;
pub mod importance;

// Entry points
pub mod engine;
pub mod auto;

// External collaborators
pub mod suggest;

pub use auto::{auto_feature_engineering, auto_feature_engineering_with_config};
pub use engine::FeatureEngine;
pub use error::{FeatureError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{FeatureError, Result};

    // Entry points
    pub use crate::auto::{auto_feature_engineering, auto_feature_engineering_with_config};
    pub use crate::config::{AutoFeatureConfig, TaskType};
    pub use crate::engine::FeatureEngine;

    // Generators
    pub use crate::feature_engineering::{
        generate_all, AggregationFeatures, AggregationOp, BinnedFeatures, BinningMode, BinningStrategy,
        DatetimeFeatures, DatetimePart, FeatureGenerator, InteractionFeatures, InteractionType,
        PolynomialFeatures, RatioFeatures, ZeroDivision,
    };

    // Selection and importance
    pub use crate::importance::{FeatureImportance, FeatureImportances};
    pub use crate::selection::{FeatureSelector, SelectionMethod, SelectionReport};

    // Tables
    pub use crate::table::{frame_from_json, ColumnKind};
}
