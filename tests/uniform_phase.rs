use std::sync::Arc;

use fm_sampler::cnf::Cnf;
use fm_sampler::literal_set::LiteralSet;
use fm_sampler::phase::{PhaseSelection, SamplePartition, UniformRandomPhase};
use fm_sampler::solver::{SolveResult, Solver};
use fm_sampler::types::{Lit, Var};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use test_log::test;

fn random_sample(num_vars: usize, size: usize, rng: &mut impl Rng) -> Vec<LiteralSet> {
    (0..size)
        .map(|_| {
            LiteralSet::from_model(
                (1..=num_vars as i32)
                    .map(|v| if rng.random_bool(0.5) { v } else { -v })
                    .collect(),
            )
        })
        .collect()
}

fn sorted(indices: &[usize]) -> Vec<usize> {
    let mut v = indices.to_vec();
    v.sort_unstable();
    v
}

#[test]
fn test_partition_round_trip_over_random_trails() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    for _ in 0..50 {
        let num_vars = rng.random_range(1..10);
        let sample = random_sample(num_vars, rng.random_range(0..20), &mut rng);
        let mut partition = SamplePartition::new(num_vars, sample.clone());
        let initial = partition.ratios().to_vec();

        // A trail: push literals on unassigned variables, pop them in stack order.
        let mut trail: Vec<Lit> = Vec::new();
        for _ in 0..200 {
            let push = trail.len() < num_vars && (trail.is_empty() || rng.random_bool(0.6));
            if push {
                let free: Vec<usize> = (0..num_vars)
                    .filter(|&i| trail.iter().all(|l| l.var().index() != i))
                    .collect();
                let var = Var::from_index(*free.choose(&mut rng).unwrap());
                let lit = var.lit(rng.random_bool(0.5));
                partition.assign(lit);
                trail.push(lit);
            } else if let Some(lit) = trail.pop() {
                partition.undo(lit);
            }

            // The partition is exact for every intermediate assignment too.
            let expected: Vec<usize> = (0..sample.len())
                .filter(|&i| trail.iter().all(|&l| !sample[i].contains(-l)))
                .collect();
            assert_eq!(sorted(partition.used_indices()), expected);
            assert_eq!(partition.ratios(), partition.recount().as_slice());
        }

        while let Some(lit) = trail.pop() {
            partition.undo(lit);
        }
        assert_eq!(sorted(partition.used_indices()), (0..sample.len()).collect::<Vec<_>>());
        assert!(partition.not_used_indices().is_empty());
        assert_eq!(partition.ratios(), initial.as_slice());
        assert_eq!(partition.ratios(), partition.recount().as_slice());
    }
}

#[test]
fn test_strategy_is_balanced_after_solving() {
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let num_vars = 10;
    let clauses: Vec<Vec<i32>> = (0..15)
        .map(|_| {
            let mut vars: Vec<i32> = (1..=num_vars as i32).collect();
            vars.shuffle(&mut rng);
            vars[..3].iter().map(|&v| if rng.random_bool(0.5) { v } else { -v }).collect()
        })
        .collect();
    let cnf = Arc::new(Cnf::from_dimacs_clauses(num_vars, clauses).unwrap());
    let sample = random_sample(num_vars, 12, &mut rng);

    let mut solver = Solver::new(cnf, UniformRandomPhase::new(num_vars, sample.clone(), 3));
    let initial = solver.strategy().partition().ratios().to_vec();
    for _ in 0..10 {
        let result = solver.solve(&[]);
        if let SolveResult::Sat(model) = result {
            solver.add_clause(&model.blocking_clause());
        }
        let strategy = solver.strategy();
        assert!(strategy.model().iter().all(|&l| l == 0));
        assert_eq!(strategy.partition().used_count(), sample.len());
        assert_eq!(strategy.partition().ratios(), initial.as_slice());
    }
    assert_eq!(solver.strategy().name(), "uniform random phase selection");
}
