use std::sync::Arc;

use log::debug;

use super::{ConfigurationGenerator, Episode};
use crate::cnf::Cnf;
use crate::error::{Error, Result};
use crate::phase::FixedPhase;
use crate::solver::{SolveResult, Solver};

/// Enumerates satisfying assignments by blocking every found model.
#[derive(Debug)]
pub struct AllConfigurations {
    solver: Solver<FixedPhase>,
    limit: usize,
    found: usize,
    done: bool,
}

impl AllConfigurations {
    /// Creates a generator producing at most `limit` configurations.
    pub fn new(cnf: Arc<Cnf>, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(Error::config("limit must be at least 1"));
        }
        Ok(Self {
            solver: Solver::new(cnf, FixedPhase::default()),
            limit,
            found: 0,
            done: false,
        })
    }

    pub fn with_conflict_budget(mut self, budget: Option<u64>) -> Self {
        self.solver.set_conflict_budget(budget);
        self
    }
}

impl ConfigurationGenerator for AllConfigurations {
    fn name(&self) -> &'static str {
        "all"
    }

    fn total_work(&self) -> Option<u64> {
        (self.limit != usize::MAX).then(|| self.limit as u64 + 1)
    }

    fn step(&mut self) -> Result<Episode> {
        if self.done || self.found >= self.limit {
            return Ok(Episode::Exhausted);
        }
        match self.solver.solve(&[]) {
            SolveResult::Sat(model) => {
                debug!("all: configuration #{}: {}", self.found + 1, model);
                self.solver.add_clause(&model.blocking_clause());
                self.found += 1;
                Ok(Episode::Accepted(model))
            }
            SolveResult::Unsat => {
                self.done = true;
                Ok(Episode::Exhausted)
            }
            SolveResult::Unknown => {
                // Retrying would hit the same budget again.
                self.done = true;
                Ok(Episode::Unresolved)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use test_log::test;

    use crate::generator::GenerationState;
    use crate::literal_set::LiteralSet;
    use crate::monitor::NullMonitor;

    fn cnf(num_vars: usize, clauses: &[&[i32]]) -> Arc<Cnf> {
        Arc::new(Cnf::from_dimacs_clauses(num_vars, clauses.iter().map(|c| c.to_vec())).unwrap())
    }

    #[test]
    fn test_enumerates_all_models() {
        let cnf = cnf(3, &[&[1, 2, 3]]);
        let configs: Vec<LiteralSet> = AllConfigurations::new(cnf.clone(), usize::MAX)
            .unwrap()
            .generate(NullMonitor)
            .collect();
        assert_eq!(configs.len(), 7);
        let distinct: HashSet<_> = configs.iter().collect();
        assert_eq!(distinct.len(), 7);
        assert!(configs.iter().all(|c| c.is_complete() && cnf.is_satisfied_by(c)));
    }

    #[test]
    fn test_limit() {
        let cnf = cnf(3, &[]);
        let configs: Vec<LiteralSet> = AllConfigurations::new(cnf, 5).unwrap().generate(NullMonitor).collect();
        assert_eq!(configs.len(), 5);
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        assert!(matches!(AllConfigurations::new(cnf(1, &[]), 0), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_unknown_ends_run_as_unresolved() {
        // Forces x1, so branching negative on x1 conflicts right away.
        let cnf = cnf(2, &[&[1, 2], &[1, -2]]);
        let outcome = AllConfigurations::new(cnf, usize::MAX)
            .unwrap()
            .with_conflict_budget(Some(0))
            .generate(NullMonitor)
            .finish();
        assert_eq!(outcome.state, GenerationState::Completed);
        assert_eq!(outcome.unresolved, 1);
        assert!(outcome.configurations.is_empty());
    }

    #[test]
    fn test_unknown_without_tolerance_fails() {
        let cnf = cnf(2, &[&[1, 2], &[1, -2]]);
        let outcome = AllConfigurations::new(cnf, usize::MAX)
            .unwrap()
            .with_conflict_budget(Some(0))
            .generate(NullMonitor)
            .with_max_unresolved(Some(0))
            .finish();
        assert_eq!(
            outcome.state,
            GenerationState::Failed {
                unresolved: 1,
                error: None
            }
        );
        assert!(outcome.configurations.is_empty());
    }

    #[test]
    fn test_unbounded_limit_has_unknown_total() {
        let generator = AllConfigurations::new(cnf(2, &[]), usize::MAX).unwrap();
        assert_eq!(generator.total_work(), None);
        let outcome = generator.generate(NullMonitor).finish();
        assert_eq!(outcome.state, GenerationState::Completed);
        assert_eq!(outcome.configurations.len(), 4);

        assert_eq!(AllConfigurations::new(cnf(2, &[]), 3).unwrap().total_work(), Some(4));
    }
}
