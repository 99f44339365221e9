use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use strong_graphs_core::params::arcs_from_density;
use strong_graphs_core::{generate, UniformWeights};

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    let weights = UniformWeights::default();
    for &size in &[100u32, 400, 1000] {
        let arcs = arcs_from_density(size, 0.05) as u32;
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &n| {
            b.iter(|| generate(7, n, arcs, 0.25, &weights).unwrap());
        });
    }
    group.finish();
}

fn bench_negative_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_all_negative");
    let weights = UniformWeights::default();
    for &size in &[50u32, 200] {
        let arcs = arcs_from_density(size, 0.5) as u32;
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &n| {
            b.iter(|| generate(3, n, arcs, 1.0, &weights).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_generate, bench_negative_heavy);
criterion_main!(benches);
