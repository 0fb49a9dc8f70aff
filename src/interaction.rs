//! Enumeration of t-wise literal interactions.
//!
//! An interaction of strength `t` is a set of `t` literals over pairwise distinct variables.
//! There are `C(n, t) * 2^t` of them for `n` variables. They are addressed by a dense index:
//!
//! ```text
//! index = rank(variables) * 2^t + pattern
//! ```
//!
//! where `rank` is the position of the sorted variable subset in colexicographic order and bit
//! `j` of `pattern` is set iff the `j`-th variable (in ascending order) occurs positively.
//! Enumerating indices in ascending order therefore visits every variable subset with all its
//! sign patterns before moving on to the next subset.

use crate::literal_set::LiteralSet;
use crate::types::{Lit, Var};

#[derive(Debug, Clone)]
pub struct Interactions {
    num_vars: usize,
    t: usize,
    /// `binom[n][k] = C(n, k)` for `n <= num_vars`, `k <= min(t, num_vars)`.
    binom: Vec<Vec<usize>>,
}

impl Interactions {
    /// A strength above `num_vars` gives an empty set.
    ///
    /// # Panics
    ///
    /// Panics if `t == 0`, or if `t <= num_vars` and `2^t` does not fit into an index.
    pub fn new(num_vars: usize, t: usize) -> Self {
        assert!(t >= 1, "Interaction strength must be >= 1");
        assert!(
            t > num_vars || t < usize::BITS as usize,
            "Interaction strength {} is too large",
            t
        );
        let width = t.min(num_vars);
        let mut binom = vec![vec![0usize; width + 1]; num_vars + 1];
        for n in 0..=num_vars {
            binom[n][0] = 1;
            for k in 1..=width.min(n) {
                binom[n][k] = binom[n - 1][k - 1].saturating_add(if k <= n - 1 { binom[n - 1][k] } else { 0 });
            }
        }
        Self { num_vars, t, binom }
    }

    pub fn strength(&self) -> usize {
        self.t
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Number of variable subsets of size `t`.
    pub fn num_subsets(&self) -> usize {
        self.choose(self.num_vars, self.t)
    }

    /// Number of interactions.
    pub fn len(&self) -> usize {
        match self.num_subsets() {
            0 => 0,
            subsets => subsets.saturating_mul(1 << self.t),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn choose(&self, n: usize, k: usize) -> usize {
        if k > n {
            0
        } else {
            self.binom[n][k]
        }
    }

    fn rank(&self, subset: &[usize]) -> usize {
        subset.iter().enumerate().map(|(i, &c)| self.choose(c, i + 1)).sum()
    }

    /// Writes the variable subset (0-based, ascending) with the given colex rank into `out`.
    fn unrank(&self, mut rank: usize, out: &mut [usize]) {
        let mut upper = self.num_vars;
        for k in (1..=self.t).rev() {
            // Largest c < upper with C(c, k) <= rank.
            let (mut lo, mut hi) = (k - 1, upper);
            while hi - lo > 1 {
                let mid = lo + (hi - lo) / 2;
                if self.choose(mid, k) <= rank {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            out[k - 1] = lo;
            rank -= self.choose(lo, k);
            upper = lo;
        }
    }

    /// Returns the literals of the interaction with the given index, ordered by variable.
    pub fn get(&self, index: usize) -> Vec<Lit> {
        debug_assert!(index < self.len());
        let mut subset = vec![0; self.t];
        self.unrank(index >> self.t, &mut subset);
        let pattern = index & ((1 << self.t) - 1);
        subset
            .iter()
            .enumerate()
            .map(|(j, &v)| Var::from_index(v).lit(pattern >> j & 1 == 1))
            .collect()
    }

    /// Returns the index of an interaction given by its literals in any order.
    ///
    /// Returns `None` if the literals do not form a valid interaction of this strength.
    pub fn index_of(&self, literals: &[Lit]) -> Option<usize> {
        if literals.len() != self.t {
            return None;
        }
        let mut sorted = literals.to_vec();
        sorted.sort_by_key(|l| l.var());
        if sorted.windows(2).any(|w| w[0].var() == w[1].var()) || sorted.iter().any(|l| l.var().index() >= self.num_vars) {
            return None;
        }
        let subset: Vec<usize> = sorted.iter().map(|l| l.var().index()).collect();
        let pattern = sorted
            .iter()
            .enumerate()
            .fold(0usize, |acc, (j, l)| acc | (l.is_positive() as usize) << j);
        Some(self.rank(&subset) << self.t | pattern)
    }

    /// Indices of all interactions fully contained in `config`, ascending.
    pub fn covered_by(&self, config: &LiteralSet) -> Vec<usize> {
        let model = config.model();
        let mut covered = Vec::new();
        self.for_each_subset(|rank, subset| {
            let mut pattern = 0;
            for (j, &v) in subset.iter().enumerate() {
                match model[v] {
                    0 => return,
                    l if l > 0 => pattern |= 1 << j,
                    _ => {}
                }
            }
            covered.push(rank << self.t | pattern);
        });
        covered
    }

    /// Visits every variable subset in colex order together with its rank.
    fn for_each_subset(&self, mut f: impl FnMut(usize, &[usize])) {
        let (n, t) = (self.num_vars, self.t);
        if t > n {
            return;
        }
        let mut subset: Vec<usize> = (0..t).collect();
        let mut rank = 0;
        loop {
            f(rank, &subset);
            rank += 1;

            let Some(j) = (0..t).find(|&j| subset[j] + 1 < if j + 1 < t { subset[j + 1] } else { n }) else {
                return;
            };
            subset[j] += 1;
            for (i, slot) in subset.iter_mut().enumerate().take(j) {
                *slot = i;
            }
        }
    }
}
