use autoprep_features::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_classification_data(n_rows: usize, n_features: usize) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let mut columns: Vec<Column> = (0..n_features)
        .map(|i| {
            let values: Vec<f64> = (0..n_rows).map(|_| rng.gen::<f64>() * 10.0).collect();
            Column::new(format!("feature_{}", i).into(), values)
        })
        .collect();

    // Label depends on the first feature
    let target: Vec<i64> = (0..n_rows)
        .map(|i| {
            let first = columns[0].f64().unwrap().get(i).unwrap_or(0.0);
            i64::from(first + rng.gen::<f64>() > 5.5)
        })
        .collect();

    columns.push(Column::new("target".into(), target));

    DataFrame::new(columns).unwrap()
}

fn feature_names(n_features: usize) -> Vec<String> {
    (0..n_features).map(|i| format!("feature_{}", i)).collect()
}

fn bench_generators(c: &mut Criterion) {
    let mut group = c.benchmark_group("generators");

    for n_rows in [1000, 10000].iter() {
        let df = create_classification_data(*n_rows, 8);
        let names = feature_names(8);

        group.bench_with_input(BenchmarkId::new("interactions", n_rows), &df, |b, df| {
            let generator = InteractionFeatures::new(names.clone());
            b.iter(|| generator.generate(black_box(df)).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("ratios", n_rows), &df, |b, df| {
            let generator = RatioFeatures::new(names.clone());
            b.iter(|| generator.generate(black_box(df)).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("polynomial", n_rows), &df, |b, df| {
            let generator = PolynomialFeatures::new(names.clone()).with_degree(2);
            b.iter(|| generator.generate(black_box(df)).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("aggregation", n_rows), &df, |b, df| {
            let generator = AggregationFeatures::new(names.clone());
            b.iter(|| generator.generate(black_box(df)).unwrap())
        });
    }

    group.finish();
}

fn bench_binning(c: &mut Criterion) {
    let mut group = c.benchmark_group("binning");
    let df = create_classification_data(10000, 4);

    for strategy in [BinningStrategy::Uniform, BinningStrategy::Quantile, BinningStrategy::KMeans] {
        group.bench_with_input(
            BenchmarkId::new("strategy", format!("{:?}", strategy)),
            &df,
            |b, df| {
                let generator = BinnedFeatures::new(feature_names(4), 10).with_strategy(strategy);
                b.iter(|| generator.generate(black_box(df)).unwrap())
            },
        );
    }

    group.finish();
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");
    let df = create_classification_data(5000, 20);

    for method in [SelectionMethod::MutualInfo, SelectionMethod::FTest, SelectionMethod::Correlation] {
        group.bench_with_input(
            BenchmarkId::new("select", format!("{:?}", method)),
            &df,
            |b, df| {
                let selector = FeatureSelector::new(method, 5);
                b.iter(|| selector.select(black_box(df), "target").unwrap())
            },
        );
    }

    group.finish();
}

fn bench_importance(c: &mut Criterion) {
    let mut group = c.benchmark_group("importance");
    group.sample_size(10); // Forest fitting is slow

    for n_rows in [1000, 5000].iter() {
        let df = create_classification_data(*n_rows, 10);

        group.bench_with_input(BenchmarkId::new("forest", n_rows), &df, |b, df| {
            let ranker = FeatureImportance::new(TaskType::Classification).with_n_estimators(20);
            b.iter(|| ranker.compute(black_box(df), "target").unwrap())
        });
    }

    group.finish();
}

fn bench_auto(c: &mut Criterion) {
    let mut group = c.benchmark_group("auto");
    group.sample_size(10);

    let df = create_classification_data(2000, 6);
    group.bench_function("auto_feature_engineering", |b| {
        b.iter(|| auto_feature_engineering(black_box(&df), None, Some("target"), Some(10)).unwrap())
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_generators,
    bench_binning,
    bench_selection,
    bench_importance,
    bench_auto
);
criterion_main!(benches);
