//! One-call feature engineering pipeline

use crate::config::{AutoFeatureConfig, TaskType};
use crate::engine::FeatureEngine;
use crate::error::{FeatureError, Result};
use crate::feature_engineering::{
    generate_all, AggregationFeatures, BinnedFeatures, FeatureGenerator, InteractionFeatures,
    PolynomialFeatures, RatioFeatures,
};
use crate::selection::FeatureSelector;
use crate::table;
use polars::prelude::*;

/// Interactions, ratios and aggregations over `numeric_columns`, then
/// optional top-k selection against `target`.
///
/// `numeric_columns = None` uses every numeric non-target column.
pub fn auto_feature_engineering(
    df: &DataFrame,
    numeric_columns: Option<&[&str]>,
    target: Option<&str>,
    select_top_k: Option<usize>,
) -> Result<DataFrame> {
    let mut config = AutoFeatureConfig::new();
    config.numeric_columns = numeric_columns.map(|cols| cols.iter().map(|c| c.to_string()).collect());
    config.target_column = target.map(str::to_string);
    config.select_top_k = select_top_k;
    auto_feature_engineering_with_config(df, &config)
}

/// Configurable variant of [`auto_feature_engineering`]
pub fn auto_feature_engineering_with_config(df: &DataFrame, config: &AutoFeatureConfig) -> Result<DataFrame> {
    let engine = FeatureEngine::new(df.clone(), config.target_column.as_deref())?;
    let target = engine.target();

    if config.select_top_k.is_some() && target.is_none() {
        return Err(FeatureError::TargetRequired("top-k feature selection"));
    }

    let columns: Vec<String> = match &config.numeric_columns {
        Some(columns) => columns.clone(),
        None => table::numeric_column_names(engine.frame())
            .into_iter()
            .filter(|c| Some(c.as_str()) != target)
            .collect(),
    };

    let interactions = InteractionFeatures::new(columns.iter().cloned())
        .with_max_interactions(config.max_interactions);
    let ratios = RatioFeatures::new(columns.iter().cloned()).with_max_ratios(config.max_ratios);
    let aggregations = AggregationFeatures::new(columns.iter().cloned())
        .with_operations(config.aggregations.clone());
    let polynomial = config
        .polynomial_degree
        .map(|degree| PolynomialFeatures::new(columns.iter().cloned()).with_degree(degree));
    let binning = config.binning_bins.map(|n_bins| {
        BinnedFeatures::new(columns.iter().cloned(), n_bins).with_strategy(config.binning_strategy)
    });

    let mut steps: Vec<&dyn FeatureGenerator> = Vec::new();
    if columns.len() >= 2 {
        steps.push(&interactions);
        steps.push(&ratios);
    }
    if !columns.is_empty() {
        if !config.aggregations.is_empty() {
            steps.push(&aggregations);
        }
        if let Some(polynomial) = &polynomial {
            steps.push(polynomial);
        }
        if let Some(binning) = &binning {
            steps.push(binning);
        }
    }

    let expanded = generate_all(engine.frame(), &steps)?;

    tracing::info!(
        source_columns = columns.len(),
        steps = steps.len(),
        width = expanded.width(),
        "Generated features"
    );

    match (config.select_top_k, target) {
        (Some(k), Some(target)) => {
            let target_column = table::column(&expanded, target)?;
            let task = config.task.unwrap_or_else(|| TaskType::infer(target_column));
            FeatureSelector::new(config.selection_method, k)
                .with_task(task)
                .select(&expanded, target)
        }
        _ => Ok(expanded),
    }
}
