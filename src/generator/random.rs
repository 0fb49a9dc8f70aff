use std::sync::Arc;

use log::debug;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{ConfigurationGenerator, Episode};
use crate::cnf::Cnf;
use crate::error::{Error, Result};
use crate::literal_set::LiteralSet;
use crate::phase::{PhaseSelection, RandomPhase, UniformRandomPhase};
use crate::solver::{SolveResult, Solver};
use crate::types::Var;

/// Draws configurations under a randomized phase selection.
///
/// By default every episode uses a fresh shuffled variable order and a [`RandomPhase`]; with
/// [`with_reference_sample`][Self::with_reference_sample] the phases follow a
/// [`UniformRandomPhase`] instead. Unless duplicates are allowed, each configuration is blocked
/// after it has been produced, so the run also ends when the solution space is exhausted.
///
/// An episode the solver gives up on still uses up one draw of the limit.
pub struct RandomConfigurations {
    solver: Solver<Box<dyn PhaseSelection>>,
    rng: ChaCha8Rng,
    limit: usize,
    found: usize,
    unresolved: usize,
    allow_duplicates: bool,
    shuffle_order: bool,
    done: bool,
}

impl RandomConfigurations {
    pub fn new(cnf: Arc<Cnf>, limit: usize, seed: u64) -> Result<Self> {
        if limit == 0 {
            return Err(Error::config("limit must be at least 1"));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let strategy: Box<dyn PhaseSelection> = Box::new(RandomPhase::new(rng.random()));
        Ok(Self {
            solver: Solver::new(cnf, strategy),
            rng,
            limit,
            found: 0,
            unresolved: 0,
            allow_duplicates: false,
            shuffle_order: true,
            done: false,
        })
    }

    /// Uses a caller-provided strategy. The variable order is kept fixed.
    pub fn with_strategy(mut self, strategy: Box<dyn PhaseSelection>) -> Self {
        self.solver.set_strategy(strategy);
        self.shuffle_order = false;
        self
    }

    /// Follows the distribution of a reference sample of full configurations.
    pub fn with_reference_sample(mut self, sample: Vec<LiteralSet>) -> Result<Self> {
        let num_vars = self.solver.num_vars();
        if let Some(bad) = sample.iter().find(|s| s.num_vars() != num_vars) {
            return Err(Error::config(format!(
                "reference sample ranges over {} variables, expected {}",
                bad.num_vars(),
                num_vars
            )));
        }
        let strategy = UniformRandomPhase::with_rng(num_vars, sample, ChaCha8Rng::seed_from_u64(self.rng.random()));
        Ok(self.with_strategy(Box::new(strategy)))
    }

    pub fn allow_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    pub fn with_conflict_budget(mut self, budget: Option<u64>) -> Self {
        self.solver.set_conflict_budget(budget);
        self
    }

    pub fn strategy(&self) -> &dyn PhaseSelection {
        self.solver.strategy().as_ref()
    }
}

impl ConfigurationGenerator for RandomConfigurations {
    fn name(&self) -> &'static str {
        "random"
    }

    fn total_work(&self) -> Option<u64> {
        (self.limit != usize::MAX).then(|| self.limit as u64 + 1)
    }

    fn step(&mut self) -> Result<Episode> {
        if self.done || self.found + self.unresolved >= self.limit {
            return Ok(Episode::Exhausted);
        }

        if self.shuffle_order {
            let mut order: Vec<Var> = (0..self.solver.num_vars()).map(Var::from_index).collect();
            order.shuffle(&mut self.rng);
            self.solver.set_order(order);
        }

        match self.solver.solve(&[]) {
            SolveResult::Sat(model) => {
                debug!("random: configuration #{}: {}", self.found + 1, model);
                if !self.allow_duplicates {
                    self.solver.add_clause(&model.blocking_clause());
                }
                self.found += 1;
                Ok(Episode::Accepted(model))
            }
            SolveResult::Unsat => {
                self.done = true;
                Ok(Episode::Exhausted)
            }
            SolveResult::Unknown => {
                self.unresolved += 1;
                Ok(Episode::Unresolved)
            }
        }
    }
}

impl std::fmt::Debug for RandomConfigurations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomConfigurations")
            .field("solver", &self.solver)
            .field("limit", &self.limit)
            .field("found", &self.found)
            .field("unresolved", &self.unresolved)
            .field("allow_duplicates", &self.allow_duplicates)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use test_log::test;

    use crate::monitor::NullMonitor;
    use crate::phase::FixedPhase;

    fn free(num_vars: usize) -> Arc<Cnf> {
        Arc::new(Cnf::from_dimacs_clauses(num_vars, Vec::<Vec<i32>>::new()).unwrap())
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let cnf = free(8);
        let a: Vec<LiteralSet> = RandomConfigurations::new(cnf.clone(), 10, 99).unwrap().generate(NullMonitor).collect();
        let b: Vec<LiteralSet> = RandomConfigurations::new(cnf.clone(), 10, 99).unwrap().generate(NullMonitor).collect();
        let c: Vec<LiteralSet> = RandomConfigurations::new(cnf, 10, 100).unwrap().generate(NullMonitor).collect();
        assert_eq!(a.len(), 10);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_no_duplicates_until_exhausted() {
        let cnf = Arc::new(Cnf::from_dimacs_clauses(3, [vec![-1, -2]]).unwrap());
        let configs: Vec<LiteralSet> = RandomConfigurations::new(cnf.clone(), 100, 1)
            .unwrap()
            .generate(NullMonitor)
            .collect();
        assert_eq!(configs.len(), 6);
        assert_eq!(configs.iter().collect::<HashSet<_>>().len(), 6);
        assert!(configs.iter().all(|c| cnf.is_satisfied_by(c)));
    }

    #[test]
    fn test_duplicates_allowed() {
        let configs: Vec<LiteralSet> = RandomConfigurations::new(free(2), 5, 1)
            .unwrap()
            .with_strategy(Box::new(FixedPhase::positive()))
            .allow_duplicates(true)
            .generate(NullMonitor)
            .collect();
        assert_eq!(configs, vec![LiteralSet::from_dimacs(2, [1, 2]); 5]);
    }

    #[test]
    fn test_reference_sample_biases_phases() {
        // Every reference configuration has x1 = x2 = x3 = true.
        let sample = vec![LiteralSet::from_dimacs(3, [1, 2, 3]); 4];
        let configs: Vec<LiteralSet> = RandomConfigurations::new(free(3), 3, 5)
            .unwrap()
            .with_reference_sample(sample)
            .unwrap()
            .allow_duplicates(true)
            .generate(NullMonitor)
            .collect();
        assert_eq!(configs, vec![LiteralSet::from_dimacs(3, [1, 2, 3]); 3]);
    }

    #[test]
    fn test_reference_sample_size_mismatch() {
        let result = RandomConfigurations::new(free(3), 3, 5)
            .unwrap()
            .with_reference_sample(vec![LiteralSet::from_dimacs(2, [1, 2])]);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_unsatisfiable_yields_nothing() {
        let cnf = Arc::new(Cnf::from_dimacs_clauses(1, [vec![1], vec![-1]]).unwrap());
        let configs: Vec<LiteralSet> = RandomConfigurations::new(cnf, 10, 0).unwrap().generate(NullMonitor).collect();
        assert!(configs.is_empty());
    }

    #[test]
    fn test_unresolved_draws_count_against_limit() {
        // Three pigeons, two holes.
        let clauses = vec![
            vec![1, 2],
            vec![3, 4],
            vec![5, 6],
            vec![-1, -3],
            vec![-1, -5],
            vec![-3, -5],
            vec![-2, -4],
            vec![-2, -6],
            vec![-4, -6],
        ];
        let cnf = Arc::new(Cnf::from_dimacs_clauses(6, clauses).unwrap());
        let mut generator = RandomConfigurations::new(cnf, 5, 1).unwrap().with_conflict_budget(Some(0));
        let mut steps = 0;
        loop {
            let episode = generator.step().unwrap();
            steps += 1;
            assert!(steps <= 6, "run did not end");
            match episode {
                Episode::Unresolved => {}
                Episode::Exhausted => break,
                other => panic!("unexpected episode {:?}", other),
            }
        }
        assert!(steps <= 6);
    }

    #[test]
    fn test_unbounded_limit_runs_to_exhaustion() {
        let generator = RandomConfigurations::new(free(2), usize::MAX, 3).unwrap();
        assert_eq!(generator.total_work(), None);
        let configs: Vec<LiteralSet> = generator.generate(NullMonitor).collect();
        assert_eq!(configs.iter().collect::<HashSet<_>>().len(), 4);
    }
}
