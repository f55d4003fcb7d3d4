use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cuisine_classifier::{Classifier, ConfusionMatrix, RbfSvm};
use ndarray::Array2;

/// `n_classes` clusters of `per_class` rows in `dims` dimensions, spaced far apart
fn synthetic_features(n_classes: usize, per_class: usize, dims: usize) -> (Array2<f32>, Vec<usize>) {
    let n = n_classes * per_class;
    let labels: Vec<usize> = (0..n).map(|i| i / per_class).collect();
    let features = Array2::from_shape_fn((n, dims), |(i, j)| {
        let class = labels[i];
        let jitter = ((i * 31 + j * 17) % 13) as f32 / 13.0 - 0.5;
        if j % n_classes == class { 10.0 + jitter } else { jitter }
    });
    (features, labels)
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("Fit");
    group.sample_size(20);
    group.warm_up_time(std::time::Duration::from_secs(1));

    // Scaling with training set size
    for &per_class in &[10, 25, 50] {
        let (x, y) = synthetic_features(6, per_class, 64);
        group.bench_function(format!("rows_{}", x.nrows()), |b| b.iter(|| {
            let mut svm = RbfSvm::default();
            svm.fit(black_box(x.view()), black_box(&y)).unwrap();
        }));
    }

    group.finish();
}

fn bench_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("Prediction");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    // Feature widths of small and large image networks
    for &dims in &[64, 1000, 2048] {
        let (x, y) = synthetic_features(6, 20, dims);
        let mut svm = RbfSvm::default();
        svm.fit(x.view(), &y).unwrap();
        let queries = x.slice(ndarray::s![..12, ..]).to_owned();

        group.bench_function(format!("dims_{}", dims), |b| b.iter(|| {
            svm.predict(black_box(queries.view())).unwrap()
        }));
    }

    group.finish();
}

fn bench_confusion_matrix(c: &mut Criterion) {
    let y_true: Vec<usize> = (0..10_000).map(|i| i % 12).collect();
    let y_pred: Vec<usize> = (0..10_000).map(|i| (i * 7) % 12).collect();

    c.bench_function("confusion_matrix_10k", |b| b.iter(|| {
        ConfusionMatrix::new(12, black_box(&y_true), black_box(&y_pred)).unwrap()
    }));
}

criterion_group!(
    benches,
    bench_fit,
    bench_predict,
    bench_confusion_matrix
);
criterion_main!(benches);
