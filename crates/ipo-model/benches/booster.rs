//! Booster fitting and attribution benchmarks.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ipo_model::{Booster, BoosterParams, PairwiseNdcg, SquaredError, tree_shap};
use ndarray::{Array1, Array2};

fn data(n_rows: usize) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((n_rows, 8), |(i, j)| ((i * 31 + j * 17) % 97) as f64);
    let y = Array1::from_shape_fn(n_rows, |i| x[[i, 0]] * 0.5 - x[[i, 3]] * 0.2 + x[[i, 7]]);
    (x, y)
}

fn bench_regressor(c: &mut Criterion) {
    let (x, y) = data(500);
    let params = BoosterParams {
        n_estimators: 50,
        ..BoosterParams::regressor_default()
    };
    c.bench_function("fit regressor 500x8", |b| {
        b.iter(|| Booster::fit(&params, &SquaredError, black_box(x.view()), y.view(), 42))
    });
}

fn bench_ranker(c: &mut Criterion) {
    let (x, y) = data(500);
    let sizes = vec![50; 10];
    let objective = PairwiseNdcg::new(y.view(), &sizes).expect("valid groups");
    let params = BoosterParams {
        n_estimators: 50,
        ..BoosterParams::ranker_default()
    };
    c.bench_function("fit ranker 10x50", |b| {
        b.iter(|| Booster::fit(&params, &objective, black_box(x.view()), y.view(), 42))
    });
}

fn bench_tree_shap(c: &mut Criterion) {
    let (x, y) = data(500);
    let params = BoosterParams {
        n_estimators: 50,
        ..BoosterParams::regressor_default()
    };
    let model = Booster::fit(&params, &SquaredError, x.view(), y.view(), 42).expect("fit");
    c.bench_function("tree_shap 500x8", |b| b.iter(|| tree_shap(&model, black_box(&x))));
}

criterion_group!(benches, bench_regressor, bench_ranker, bench_tree_shap);
criterion_main!(benches);
