use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use credit_score_core::gbdt::{GbdtModel, Node, Tree};
use credit_score_core::{
    ClassifierModel, FeatureVector, Predictor, ScoringParams, StandardScaler, Threshold,
    FEATURE_COUNT,
};
use std::sync::Arc;

const TREE_COUNT: usize = 500;

fn ensemble() -> ClassifierModel {
    let trees = (0..TREE_COUNT)
        .map(|i| {
            let feature = (i % FEATURE_COUNT) as i32;
            Tree::new(
                vec![
                    Node::internal(feature, 0.0, 1, 2),
                    Node::internal((feature + 1) % FEATURE_COUNT as i32, 0.5, 3, 4),
                    Node::leaf(0.02),
                    Node::leaf(-0.03),
                    Node::leaf(0.01),
                ],
                0.03,
            )
        })
        .collect();
    ClassifierModel::TreeEnsemble(GbdtModel::new(trees, -2.2))
}

fn profiles() -> Vec<FeatureVector> {
    (0..64)
        .map(|seed| {
            let values = (0..FEATURE_COUNT)
                .map(|j| ((seed * 31 + j * 7) % 23) as f64 / 11.0 - 1.0)
                .collect();
            FeatureVector::new(values).expect("bench profile has 200 finite values")
        })
        .collect()
}

fn bench_transform(c: &mut Criterion) {
    let params = ScoringParams::default();
    c.bench_function("probability_to_score", |b| {
        b.iter(|| params.probability_to_score(black_box(0.365)))
    });
}

fn bench_predict(c: &mut Criterion) {
    let predictor = Predictor::new(StandardScaler::identity(FEATURE_COUNT), Arc::new(ensemble()))
        .with_scoring(ScoringParams::default());
    let batch = profiles();
    let threshold = Threshold::default();

    let mut group = c.benchmark_group("predict_with_threshold");
    group.throughput(Throughput::Elements(batch.len() as u64));
    group.bench_function("gbdt_500_trees", |b| {
        b.iter(|| {
            for features in &batch {
                let _ = predictor.predict_with_threshold(black_box(features), threshold);
            }
        })
    });
    group.finish();
}

criterion_group!(benches, bench_transform, bench_predict);
criterion_main!(benches);
