
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use nextpoint::sampler::generate;
use nextpoint::surrogate::{GaussianProcess, Predictor, Surrogate};
use test_functions::hartmann6;

/// Hartmann-6 outcomes at `n` Latin hypercube points.
fn training_set(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    let x = generate(&[0.0; 6], &[1.0; 6], n, 42).unwrap();
    let y = x.iter().map(|p| -hartmann6(p)).collect();
    (x, y)
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("gp_fit");
    group.sample_size(10);

    for n in [10, 30, 60] {
        let (x, y) = training_set(n);
        for restarts in [0, 4] {
            let gp = GaussianProcess::builder(6)
                .restarts(restarts)
                .build()
                .unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("restarts_{restarts}"), n),
                &n,
                |b, _| {
                    b.iter(|| gp.fit(&x, &y).unwrap());
                },
            );
        }
    }

    group.finish();
}

fn bench_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("gp_predict");
    let (x, y) = training_set(40);
    let model = GaussianProcess::builder(6)
        .restarts(2)
        .build()
        .unwrap()
        .fit(&x, &y)
        .unwrap();

    for n_queries in [64, 512] {
        let queries = generate(&[0.0; 6], &[1.0; 6], n_queries, 7).unwrap();
        group.bench_with_input(
            BenchmarkId::new("queries", n_queries),
            &n_queries,
            |b, _| {
                b.iter(|| model.predict(&queries));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_fit, bench_predict);
criterion_main!(benches);
