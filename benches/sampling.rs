//! Sampling benchmarks on random feature-model-like formulas.
//!
//! Run with:
//! ```bash
//! cargo bench --bench sampling
//! ```

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fm_sampler::cnf::Cnf;
use fm_sampler::generator::{ConfigurationGenerator, PairWise, RandomConfigurations, TWise};
use fm_sampler::monitor::NullMonitor;
use fm_sampler::phase::FixedPhase;
use fm_sampler::solver::Solver;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

// ============================================================================
// Helper: random constraints
// ============================================================================

/// A satisfiable-leaning random CNF: a tree of requires-edges plus sparse 3-clauses.
fn random_model(num_vars: usize, num_clauses: usize, seed: u64) -> Arc<Cnf> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut clauses: Vec<Vec<i32>> = Vec::new();

    // Child requires parent.
    for child in 2..=num_vars as i32 {
        let parent = rng.random_range(1..child);
        clauses.push(vec![-child, parent]);
    }

    while clauses.len() < num_vars - 1 + num_clauses {
        let mut vars: Vec<i32> = (1..=num_vars as i32).collect();
        vars.shuffle(&mut rng);
        let clause: Vec<i32> = vars[..3]
            .iter()
            .map(|&v| if rng.random_bool(0.5) { v } else { -v })
            .collect();
        clauses.push(clause);
    }

    Arc::new(Cnf::from_dimacs_clauses(num_vars, clauses).unwrap())
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solver/solve");

    for num_vars in [50, 100, 200] {
        let cnf = random_model(num_vars, num_vars, 42);
        group.bench_with_input(BenchmarkId::new("fixed", num_vars), &cnf, |b, cnf| {
            b.iter(|| {
                let mut solver = Solver::new(Arc::clone(cnf), FixedPhase::default());
                solver.solve(&[])
            });
        });
    }

    group.finish();
}

fn bench_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("generator/random");
    let limit = 50;
    group.throughput(Throughput::Elements(limit as u64));

    for num_vars in [50, 100] {
        let cnf = random_model(num_vars, num_vars / 2, 7);
        group.bench_with_input(BenchmarkId::new("limit=50", num_vars), &cnf, |b, cnf| {
            b.iter(|| {
                let generator = RandomConfigurations::new(Arc::clone(cnf), limit, 1).unwrap();
                generator.generate(NullMonitor).count()
            });
        });
    }

    group.finish();
}

fn bench_pairwise(c: &mut Criterion) {
    let mut group = c.benchmark_group("generator/pairwise");
    group.sample_size(10);

    for num_vars in [20, 40] {
        let cnf = random_model(num_vars, num_vars / 2, 3);
        group.bench_with_input(BenchmarkId::new("pairwise", num_vars), &cnf, |b, cnf| {
            b.iter(|| {
                let generator = PairWise::new(Arc::clone(cnf), usize::MAX).unwrap();
                generator.generate(NullMonitor).count()
            });
        });
    }

    group.finish();
}

fn bench_twise(c: &mut Criterion) {
    let mut group = c.benchmark_group("generator/twise");
    group.sample_size(10);

    let cnf = random_model(30, 15, 3);
    for (t, iterations) in [(2, 1), (2, 5), (3, 1)] {
        group.bench_with_input(
            BenchmarkId::new(format!("t={}", t), format!("m={}", iterations)),
            &(t, iterations),
            |b, &(t, iterations)| {
                b.iter(|| {
                    let generator = TWise::new(Arc::clone(&cnf), t, iterations, 1).unwrap();
                    generator.generate(NullMonitor).count()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_solve, bench_random, bench_pairwise, bench_twise);

criterion_main!(benches);
