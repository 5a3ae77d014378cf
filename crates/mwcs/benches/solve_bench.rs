//! Criterion benchmarks for preprocessing, heuristics and full solves.
//! Focus sizes: n in {20, 50, 100} vertices with about 2n edges.
//! Results land under target/criterion.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use mwcs::heuristics::{best_effort, HeuristicCfg};
use mwcs::prelude::*;
use mwcs::preprocess::preprocess;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_instance(n: usize, seed: u64) -> Instance {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut b = InstanceBuilder::new();
    let nodes: Vec<NodeId> = (0..n)
        .map(|_| {
            let w = rng.gen_range(-4.0..3.0);
            b.add_weighted_node(w)
        })
        .collect();
    // A random spanning tree keeps the graph connected.
    for i in 1..n {
        let j = rng.gen_range(0..i);
        let w = rng.gen_range(-1.0..0.5);
        b.add_weighted_edge(nodes[i], nodes[j], w);
    }
    for _ in 0..n {
        let (u, v) = (rng.gen_range(0..n), rng.gen_range(0..n));
        let w = rng.gen_range(-1.0..0.5);
        b.add_weighted_edge(nodes[u], nodes[v], w);
    }
    b.build().expect("plain instance")
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("mwcs");
    group.sample_size(10);
    for &n in &[20usize, 50, 100] {
        group.bench_with_input(BenchmarkId::new("preprocess_full", n), &n, |b, &n| {
            b.iter_batched(
                || random_instance(n, 43),
                |mut inst| {
                    let _red = preprocess(&mut inst, PreprocessLevel::Full);
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("best_effort", n), &n, |b, &n| {
            let inst = random_instance(n, 44);
            let cfg = HeuristicCfg::default();
            b.iter(|| best_effort(&inst, None, &cfg))
        });

        group.bench_with_input(BenchmarkId::new("solve_default", n), &n, |b, &n| {
            let inst = random_instance(n, 45);
            let solver = Solver::new(SolverCfg::default());
            b.iter(|| solver.solve(&inst).expect("solve"))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
