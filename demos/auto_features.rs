//! Generate, select and rank features on a synthetic loan table.
//!
//! Run with `RUST_LOG=autoprep_features=debug` to see each generator step.

use autoprep_features::prelude::*;
use autoprep_features::suggest::{FeatureSuggestor, ProviderKind, StaticClient};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn loan_table(n_rows: usize) -> PolarsResult<DataFrame> {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    let age: Vec<i64> = (0..n_rows).map(|_| rng.gen_range(18..80)).collect();
    let income: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(15_000.0..120_000.0)).collect();
    let loan_amount: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(1_000.0..50_000.0)).collect();
    let target: Vec<i64> = income
        .iter()
        .zip(&loan_amount)
        .map(|(i, l)| i64::from(l / i > 0.25))
        .collect();

    df!(
        "age" => age,
        "income" => income,
        "loan_amount" => loan_amount,
        "target" => target,
    )
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autoprep_features=info".into()),
        )
        .init();

    let df = loan_table(500)?;
    println!("Input: {:?}", df.shape());

    let expanded = auto_feature_engineering(&df, None, Some("target"), None)?;
    println!("Expanded: {:?}", expanded.shape());

    let config = AutoFeatureConfig::new()
        .with_target("target")
        .with_select_top_k(5)
        .with_binning(5, BinningStrategy::Quantile);
    let selected = auto_feature_engineering_with_config(&df, &config)?;
    println!("Selected: {:?}", selected.get_column_names());

    let engine = FeatureEngine::new(selected, Some("target"))?;
    let importance = FeatureImportance::new(TaskType::Classification)
        .with_n_estimators(50)
        .compute(engine.frame(), "target")?;
    for (name, score) in importance.sorted() {
        println!("  {:<32} {:.4}", name, score);
    }

    let suggestor = FeatureSuggestor::new(StaticClient::new(
        ProviderKind::Ollama,
        "```json\n[{\"name\": \"loan_to_income\", \"method\": \"loan_amount / income\", \"impact\": \"high\"}]\n```",
    ));
    for suggestion in suggestor.suggest_features(&df, TaskType::Classification, Some("target")) {
        println!("Suggested: {:?}", suggestion);
    }

    Ok(())
}
