use std::sync::Arc;

use log::debug;

use super::{ConfigurationGenerator, Episode};
use crate::bitset::BitSet;
use crate::cnf::Cnf;
use crate::error::{Error, Result};
use crate::interaction::Interactions;
use crate::phase::CoveragePhase;
use crate::solver::{SolveResult, Solver};
use crate::types::Lit;

/// Covers every feasible pair of literals with at least one configuration.
///
/// Pairs are visited in a fixed order. A pair already covered by an accepted configuration is
/// skipped; otherwise the solver is asked to extend it to a full configuration. Pairs that cannot
/// be extended are recorded as infeasible and dropped from the target.
#[derive(Debug)]
pub struct PairWise {
    solver: Solver<CoveragePhase>,
    pairs: Interactions,
    /// Covered pairs, plus pairs excluded from the target.
    done: BitSet,
    cursor: usize,
    checked: bool,
    infeasible: Vec<usize>,
    unresolved: Vec<usize>,
    limit: usize,
    found: usize,
}

impl PairWise {
    pub fn new(cnf: Arc<Cnf>, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(Error::config("limit must be at least 1"));
        }
        let pairs = Interactions::new(cnf.num_vars(), 2);
        Ok(Self {
            solver: Solver::new(Arc::clone(&cnf), CoveragePhase::new(cnf.num_vars())),
            done: BitSet::new(pairs.len()),
            pairs,
            cursor: 0,
            checked: false,
            infeasible: Vec::new(),
            unresolved: Vec::new(),
            limit,
            found: 0,
        })
    }

    pub fn with_conflict_budget(mut self, budget: Option<u64>) -> Self {
        self.solver.set_conflict_budget(budget);
        self
    }

    /// Pairs proven not to occur in any valid configuration.
    pub fn infeasible(&self) -> Vec<Vec<Lit>> {
        self.infeasible.iter().map(|&i| self.pairs.get(i)).collect()
    }

    /// Pairs skipped because the solver gave up.
    pub fn unresolved(&self) -> Vec<Vec<Lit>> {
        self.unresolved.iter().map(|&i| self.pairs.get(i)).collect()
    }
}

impl ConfigurationGenerator for PairWise {
    fn name(&self) -> &'static str {
        "pairwise"
    }

    fn total_work(&self) -> Option<u64> {
        Some(self.pairs.len() as u64 + 2)
    }

    fn step(&mut self) -> Result<Episode> {
        if !self.checked {
            self.checked = true;
            return Ok(match self.solver.solve(&[]) {
                SolveResult::Unsat => {
                    debug!("pairwise: constraints are unsatisfiable");
                    self.cursor = self.pairs.len();
                    Episode::Exhausted
                }
                _ => Episode::Pending,
            });
        }

        if self.found >= self.limit {
            return Ok(Episode::Exhausted);
        }
        let Some(index) = self.done.next_clear(self.cursor) else {
            self.cursor = self.pairs.len();
            return Ok(Episode::Exhausted);
        };
        self.cursor = index + 1;
        self.done.insert(index);

        let target = self.pairs.get(index);
        match self.solver.solve(&target) {
            SolveResult::Sat(model) => {
                for covered in self.pairs.covered_by(&model) {
                    self.done.insert(covered);
                }
                self.solver.strategy_mut().record(&model);
                self.found += 1;
                debug!("pairwise: configuration #{} covers {:?}", self.found, target);
                Ok(Episode::Accepted(model))
            }
            SolveResult::Unsat => {
                debug!("pairwise: {:?} is infeasible", target);
                self.infeasible.push(index);
                Ok(Episode::Pending)
            }
            SolveResult::Unknown => {
                self.unresolved.push(index);
                Ok(Episode::Unresolved)
            }
        }
    }
}
