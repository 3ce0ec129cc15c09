//! Benchmarks for unitary synthesis
//!
//! Run with: cargo bench -p qsyn-compile

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qsyn_compile::synthesis::DiagonalSynthesizer;
use qsyn_compile::{AxisPolicy, Decomposer, SynthesisConfig, TwoQubitSynthesizer, compile, random_unitary};
use qsyn_ir::{Device, GridQubit};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Benchmark KAK synthesis of a random two-qubit unitary
fn bench_two_qubit(c: &mut Criterion) {
    let config = SynthesisConfig::default();
    let synth = TwoQubitSynthesizer::new(&config);
    let u = random_unitary(2, &mut StdRng::seed_from_u64(1));

    c.bench_function("kak_random", |b| {
        b.iter(|| synth.synthesize(black_box(&u), 0, 1).unwrap());
    });
}

/// Benchmark the recursive decomposition alone
fn bench_decompose(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompose");
    let config = SynthesisConfig::default();
    let decomposer = Decomposer::new(&config, AxisPolicy::MostSignificant);

    for n in [3usize, 4, 5, 6] {
        let u = random_unitary(n, &mut StdRng::seed_from_u64(n as u64));
        group.bench_with_input(BenchmarkId::new("random", n), &u, |b, u| {
            b.iter(|| decomposer.decompose(black_box(u)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark diagonal synthesis
fn bench_diagonal(c: &mut Criterion) {
    let config = SynthesisConfig::default();
    let synth = DiagonalSynthesizer::new(&config);
    let phases: Vec<f64> = (0..32).map(|i| (i as f64 * 0.37).sin()).collect();
    let qubits: Vec<usize> = (0..5).collect();

    c.bench_function("diagonal_5q", |b| {
        b.iter(|| synth.synthesize(black_box(&phases), &qubits).unwrap());
    });
}

/// Benchmark the full pipeline on the Sycamore grid
fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    group.sample_size(10);
    let device = Device::sycamore();
    let config = SynthesisConfig::default();

    for n in [2usize, 4, 6] {
        let targets = GridQubit::placement(n, 3, 3);
        let u = random_unitary(n, &mut StdRng::seed_from_u64(100 + n as u64));
        group.bench_with_input(BenchmarkId::new("random", n), &u, |b, u| {
            b.iter(|| compile(&targets, black_box(u), &device, &config).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_two_qubit,
    bench_decompose,
    bench_diagonal,
    bench_compile,
);
criterion_main!(benches);
