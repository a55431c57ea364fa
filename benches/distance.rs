//! Benchmarks for distance computations and SBQ encoding.
//!
//! Distance kernels dominate both graph search and the clustering distance
//! matrix; Hamming distance dominates the quantized fallback scan.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use simcheck::distance::{cosine_distance, euclidean_distance};
use simcheck::simd;

// === Generators ===

fn random_vectors(n: usize, dim: usize) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.random::<f32>() * 2.0 - 1.0).collect())
        .collect()
}

// === Benchmarks ===

fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernels");

    for dim in [64, 384, 768, 1536] {
        group.throughput(Throughput::Elements(dim as u64));
        let vectors = random_vectors(2, dim);
        let (a, b) = (vectors[0].as_slice(), vectors[1].as_slice());

        group.bench_with_input(BenchmarkId::new("dot", dim), &dim, |bench, _| {
            bench.iter(|| simd::dot(black_box(a), black_box(b)));
        });
        group.bench_with_input(BenchmarkId::new("cosine", dim), &dim, |bench, _| {
            bench.iter(|| simd::cosine(black_box(a), black_box(b)));
        });
    }

    group.finish();
}

fn bench_checked_distances(c: &mut Criterion) {
    let mut group = c.benchmark_group("checked_distance");
    let vectors = random_vectors(2, 384);
    let (a, b) = (vectors[0].as_slice(), vectors[1].as_slice());

    group.bench_function("cosine_384", |bench| {
        bench.iter(|| cosine_distance(black_box(a), black_box(b)));
    });
    group.bench_function("euclidean_384", |bench| {
        bench.iter(|| euclidean_distance(black_box(a), black_box(b)));
    });

    group.finish();
}

#[cfg(feature = "sbq")]
fn bench_sbq(c: &mut Criterion) {
    use simcheck::quantization::{hamming_distance, ScalarQuantizer};

    let mut group = c.benchmark_group("sbq");
    let data = random_vectors(1000, 384);
    let quantizer = ScalarQuantizer::train(data.iter().map(Vec::as_slice)).unwrap();
    let a = quantizer.encode(&data[0]).unwrap();
    let b = quantizer.encode(&data[1]).unwrap();

    group.bench_function("train_1000x384", |bench| {
        bench.iter(|| ScalarQuantizer::train(black_box(data.iter().map(Vec::as_slice))));
    });
    group.bench_function("encode_384", |bench| {
        bench.iter(|| quantizer.encode(black_box(data[2].as_slice())));
    });
    group.bench_function("hamming_384", |bench| {
        bench.iter(|| hamming_distance(black_box(a.as_slice()), black_box(b.as_slice())));
    });

    group.finish();
}

#[cfg(not(feature = "sbq"))]
fn bench_sbq(_c: &mut Criterion) {}

criterion_group!(benches, bench_kernels, bench_checked_distances, bench_sbq);
criterion_main!(benches);
