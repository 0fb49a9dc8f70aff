use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{PhaseSelection, SamplePartition};
use crate::literal_set::LiteralSet;
use crate::types::{Lit, Var};

/// Uses a reference sample of configurations to pick phases so that the generated
/// configurations follow the distribution of the sample.
///
/// On `select(v)` a number `r` is drawn uniformly from `[0, used)` and the positive literal is
/// returned iff `r < ratio[v]`, i.e. the probability of branching to true is the fraction of
/// still-consistent reference samples that set `v` true. With no consistent sample left it
/// falls back to a fair coin.
#[derive(Debug, Clone)]
pub struct UniformRandomPhase {
    partition: SamplePartition,
    model: Vec<i32>,
    rng: ChaCha8Rng,
}

impl UniformRandomPhase {
    pub fn new(num_vars: usize, sample: Vec<LiteralSet>, seed: u64) -> Self {
        Self::with_rng(num_vars, sample, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn with_rng(num_vars: usize, sample: Vec<LiteralSet>, rng: ChaCha8Rng) -> Self {
        Self {
            partition: SamplePartition::new(num_vars, sample),
            model: vec![0; num_vars],
            rng,
        }
    }

    pub fn partition(&self) -> &SamplePartition {
        &self.partition
    }

    /// The partial assignment as seen through the assign/undo callbacks.
    pub fn model(&self) -> &[i32] {
        &self.model
    }
}

impl PhaseSelection for UniformRandomPhase {
    fn select(&mut self, var: Var) -> Lit {
        let used = self.partition.used_count();
        if used == 0 {
            return var.lit(self.rng.random_bool(0.5));
        }
        let r = self.rng.random_range(0..used);
        var.lit(r < self.partition.ratio(var) as usize)
    }

    fn assign(&mut self, lit: Lit) {
        self.model[lit.var().index()] = lit.to_dimacs();
        self.partition.assign(lit);
    }

    fn undo(&mut self, var: Var) {
        let slot = &mut self.model[var.index()];
        if *slot == 0 {
            log::warn!("undo of unassigned variable {}", var);
            return;
        }
        let lit = Lit::from_dimacs(*slot);
        *slot = 0;
        self.partition.undo(lit);
    }

    fn name(&self) -> &'static str {
        "uniform random phase selection"
    }
}
