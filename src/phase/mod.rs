//! Phase selection strategies.
//!
//! The [`Solver`][crate::solver::Solver] consults a [`PhaseSelection`] whenever it has to branch
//! on an unassigned variable, and notifies it of every assignment and every retraction, whether
//! caused by a decision or by unit propagation. Strategies are therefore able to keep statistics
//! that follow the live partial assignment exactly.
//!
//! Available strategies:
//!
//! - [`FixedPhase`]: always the same polarity, no bookkeeping.
//! - [`RandomPhase`]: a fair coin from an explicitly seeded generator.
//! - [`CoveragePhase`]: prefers the polarity that occurred less often in accepted configurations.
//! - [`UniformRandomPhase`]: reproduces the marginal distribution of a reference sample.

mod partition;
mod uniform;

pub use partition::SamplePartition;
pub use uniform::UniformRandomPhase;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::literal_set::LiteralSet;
use crate::types::{Lit, Var};

/// Callback interface between the search and a branching policy.
pub trait PhaseSelection {
    /// Returns the literal of `var` the search should try first.
    fn select(&mut self, var: Var) -> Lit;

    /// Called after `lit` has been put on the trail.
    fn assign(&mut self, lit: Lit);

    /// Called after the assignment of `var` has been retracted.
    ///
    /// Must exactly reverse the bookkeeping of the matching [`assign`][PhaseSelection::assign].
    fn undo(&mut self, var: Var);

    fn name(&self) -> &'static str;
}

impl<P: PhaseSelection + ?Sized> PhaseSelection for Box<P> {
    fn select(&mut self, var: Var) -> Lit {
        (**self).select(var)
    }

    fn assign(&mut self, lit: Lit) {
        (**self).assign(lit)
    }

    fn undo(&mut self, var: Var) {
        (**self).undo(var)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Always branches on the same polarity.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FixedPhase {
    positive: bool,
}

impl FixedPhase {
    pub fn positive() -> Self {
        Self { positive: true }
    }

    pub fn negative() -> Self {
        Self { positive: false }
    }
}

impl Default for FixedPhase {
    fn default() -> Self {
        Self::negative()
    }
}

impl PhaseSelection for FixedPhase {
    fn select(&mut self, var: Var) -> Lit {
        var.lit(self.positive)
    }

    fn assign(&mut self, _lit: Lit) {}

    fn undo(&mut self, _var: Var) {}

    fn name(&self) -> &'static str {
        if self.positive {
            "fixed positive phase selection"
        } else {
            "fixed negative phase selection"
        }
    }
}

/// Picks each polarity with probability 1/2.
#[derive(Debug, Clone)]
pub struct RandomPhase {
    rng: ChaCha8Rng,
}

impl RandomPhase {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_rng(rng: ChaCha8Rng) -> Self {
        Self { rng }
    }
}

impl PhaseSelection for RandomPhase {
    fn select(&mut self, var: Var) -> Lit {
        var.lit(self.rng.random_bool(0.5))
    }

    fn assign(&mut self, _lit: Lit) {}

    fn undo(&mut self, _var: Var) {}

    fn name(&self) -> &'static str {
        "random phase selection"
    }
}

/// Steers the search towards literals that are under-represented in the configurations
/// accepted so far.
///
/// Ties go to the negative literal.
#[derive(Debug, Clone)]
pub struct CoveragePhase {
    positive: Vec<u32>,
    negative: Vec<u32>,
}

impl CoveragePhase {
    pub fn new(num_vars: usize) -> Self {
        Self {
            positive: vec![0; num_vars],
            negative: vec![0; num_vars],
        }
    }

    /// Accounts for a configuration that became part of the result.
    pub fn record(&mut self, config: &LiteralSet) {
        for lit in config.literals() {
            let i = lit.var().index();
            if lit.is_positive() {
                self.positive[i] += 1;
            } else {
                self.negative[i] += 1;
            }
        }
    }

    /// How often `lit` occurred in recorded configurations.
    pub fn occurrences(&self, lit: Lit) -> u32 {
        let i = lit.var().index();
        if lit.is_positive() {
            self.positive[i]
        } else {
            self.negative[i]
        }
    }
}

impl PhaseSelection for CoveragePhase {
    fn select(&mut self, var: Var) -> Lit {
        let i = var.index();
        var.lit(self.positive[i] < self.negative[i])
    }

    fn assign(&mut self, _lit: Lit) {}

    fn undo(&mut self, _var: Var) {}

    fn name(&self) -> &'static str {
        "coverage phase selection"
    }
}
