//! Used/not-used partition of a reference sample.

use crate::literal_set::LiteralSet;
use crate::types::{Lit, Var};

/// Splits a reference sample into the samples that agree with the live partial assignment
/// ("used") and those that do not ("not used").
///
/// Samples live in a single arena and are referred to by index. Each sample carries a conflict
/// count: the number of currently assigned literals it disagrees with. A sample is used iff its
/// count is zero, so the partition is exact after every [`assign`][Self::assign] /
/// [`undo`][Self::undo], not only after returning to the empty assignment.
///
/// # Invariants
///
/// - `used` and `not_used` are disjoint and together contain every sample index once
/// - `ratio[v]` equals the number of used samples assigning `v` true
#[derive(Debug, Clone)]
pub struct SamplePartition {
    samples: Vec<LiteralSet>,
    conflicts: Vec<u32>,
    used: Vec<usize>,
    not_used: Vec<usize>,
    ratio: Vec<u32>,
}

impl SamplePartition {
    /// # Panics
    ///
    /// Panics if a sample does not range over exactly `num_vars` variables.
    pub fn new(num_vars: usize, samples: Vec<LiteralSet>) -> Self {
        for sample in &samples {
            assert_eq!(sample.num_vars(), num_vars, "Sample size does not match the number of variables");
        }
        let mut partition = Self {
            conflicts: vec![0; samples.len()],
            used: (0..samples.len()).collect(),
            not_used: Vec::new(),
            ratio: vec![0; num_vars],
            samples,
        };
        partition.ratio = partition.recount();
        partition
    }

    pub fn num_vars(&self) -> usize {
        self.ratio.len()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn used_count(&self) -> usize {
        self.used.len()
    }

    pub fn not_used_count(&self) -> usize {
        self.not_used.len()
    }

    /// Number of used samples assigning `var` true.
    pub fn ratio(&self, var: Var) -> u32 {
        self.ratio[var.index()]
    }

    pub fn ratios(&self) -> &[u32] {
        &self.ratio
    }

    pub fn used(&self) -> impl Iterator<Item = &LiteralSet> + '_ {
        self.used.iter().map(|&i| &self.samples[i])
    }

    pub fn not_used(&self) -> impl Iterator<Item = &LiteralSet> + '_ {
        self.not_used.iter().map(|&i| &self.samples[i])
    }

    pub fn used_indices(&self) -> &[usize] {
        &self.used
    }

    pub fn not_used_indices(&self) -> &[usize] {
        &self.not_used
    }

    /// Recomputes the ratio table from the used samples, ignoring the incremental state.
    pub fn recount(&self) -> Vec<u32> {
        let mut ratio = vec![0; self.ratio.len()];
        for &i in &self.used {
            for lit in self.samples[i].literals() {
                if lit.is_positive() {
                    ratio[lit.var().index()] += 1;
                }
            }
        }
        ratio
    }

    /// Moves every used sample that disagrees with `lit` to the not-used side.
    pub fn assign(&mut self, lit: Lit) {
        let mut moved = Vec::new();
        for (i, sample) in self.samples.iter().enumerate() {
            if sample.contains(-lit) {
                self.conflicts[i] += 1;
                if self.conflicts[i] == 1 {
                    moved.push(i);
                }
            }
        }
        if moved.is_empty() {
            return;
        }

        let conflicts = &self.conflicts;
        self.used.retain(|&i| conflicts[i] == 0);
        for &i in &moved {
            Self::shift(&mut self.ratio, &self.samples[i], false);
        }
        self.not_used.extend(moved);
    }

    /// Reverses [`assign`][Self::assign] for the literal `lit` that is being retracted.
    pub fn undo(&mut self, lit: Lit) {
        let mut moved = Vec::new();
        for (i, sample) in self.samples.iter().enumerate() {
            if sample.contains(-lit) {
                debug_assert!(self.conflicts[i] > 0, "undo without matching assign");
                self.conflicts[i] -= 1;
                if self.conflicts[i] == 0 {
                    moved.push(i);
                }
            }
        }
        if moved.is_empty() {
            return;
        }

        let conflicts = &self.conflicts;
        self.not_used.retain(|&i| conflicts[i] > 0);
        for &i in &moved {
            Self::shift(&mut self.ratio, &self.samples[i], true);
        }
        self.used.extend(moved);
    }

    fn shift(ratio: &mut [u32], sample: &LiteralSet, increment: bool) {
        for lit in sample.literals().filter(|l| l.is_positive()) {
            let slot = &mut ratio[lit.var().index()];
            if increment {
                *slot += 1;
            } else {
                *slot -= 1;
            }
        }
    }
}
