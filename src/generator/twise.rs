//! T-wise covering array construction.
//!
//! The generator works through all `t`-wise interactions as an explicit work-list:
//!
//! 1. **Construction.** Take the next interaction that is neither covered nor excluded and ask
//!    the solver to extend it. On success, complete the configuration one free variable at a
//!    time in ascending order: pick the literal that closes the most open interactions together
//!    with the literals fixed so far (ties go negative), and keep it only if the solver still
//!    finds a model under it. The final model is accepted and everything it contains is marked
//!    covered. Infeasible interactions are recorded and excluded from the target.
//! 2. **Refinement.** Each further iteration drops configurations that cover nothing uniquely,
//!    then removes the two configurations with the smallest unique coverage and re-covers what
//!    they leave open in a shuffled order. The replacement is kept only if it is smaller.
//! 3. **Emission.** The final configurations are yielded one per step.
//!
//! Every step is one bounded unit of work, so cancellation is observed between targets and
//! between refinement passes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::{ConfigurationGenerator, Episode};
use crate::bitset::BitSet;
use crate::cnf::Cnf;
use crate::error::{Error, Result};
use crate::interaction::Interactions;
use crate::literal_set::LiteralSet;
use crate::phase::CoveragePhase;
use crate::solver::{SolveResult, Solver};
use crate::types::{Lit, Var};

/// Upper bound on solver calls spent completing one configuration.
const MAX_COMPLETION_SOLVES: usize = 256;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Stage {
    Check,
    Construct { cursor: usize },
    Refine { iteration: usize },
    Emit { next: usize },
    Done,
}

#[derive(Debug)]
pub struct TWise {
    solver: Solver<CoveragePhase>,
    interactions: Interactions,
    iterations: usize,
    rng: ChaCha8Rng,
    /// Covered interactions, plus interactions excluded from the target.
    done: BitSet,
    infeasible: Vec<usize>,
    unresolved: Vec<usize>,
    configs: Vec<LiteralSet>,
    stage: Stage,
    steps: u64,
}

impl TWise {
    /// Creates a generator for strength `t` with `iterations` passes (the first pass is the
    /// construction, every further one a refinement).
    pub fn new(cnf: Arc<Cnf>, t: usize, iterations: usize, seed: u64) -> Result<Self> {
        if t == 0 {
            return Err(Error::config("t must be at least 1"));
        }
        if t <= cnf.num_vars() && t >= usize::BITS as usize {
            return Err(Error::config(format!("t = {} is too large", t)));
        }
        if iterations == 0 {
            return Err(Error::config("the number of iterations must be at least 1"));
        }
        let interactions = Interactions::new(cnf.num_vars(), t);
        info!(
            "t-wise: {} variables, t = {}, {} interactions",
            cnf.num_vars(),
            t,
            interactions.len()
        );
        Ok(Self {
            solver: Solver::new(Arc::clone(&cnf), CoveragePhase::new(cnf.num_vars())),
            done: BitSet::new(interactions.len()),
            interactions,
            iterations,
            rng: ChaCha8Rng::seed_from_u64(seed),
            infeasible: Vec::new(),
            unresolved: Vec::new(),
            configs: Vec::new(),
            stage: Stage::Check,
            steps: 0,
        })
    }

    pub fn with_conflict_budget(mut self, budget: Option<u64>) -> Self {
        self.solver.set_conflict_budget(budget);
        self
    }

    pub fn strength(&self) -> usize {
        self.interactions.strength()
    }

    /// Interactions proven not to occur in any valid configuration.
    pub fn infeasible(&self) -> Vec<Vec<Lit>> {
        self.infeasible.iter().map(|&i| self.interactions.get(i)).collect()
    }

    /// Interactions skipped because the solver gave up.
    pub fn unresolved(&self) -> Vec<Vec<Lit>> {
        self.unresolved.iter().map(|&i| self.interactions.get(i)).collect()
    }

    /// The current configuration set.
    pub fn configurations(&self) -> &[LiteralSet] {
        &self.configs
    }

    fn accept(&mut self, model: LiteralSet) {
        for i in self.interactions.covered_by(&model) {
            self.done.insert(i);
        }
        self.solver.strategy_mut().record(&model);
        debug!("t-wise: configuration #{}: {}", self.configs.len() + 1, model);
        self.configs.push(model);
    }

    fn construct(&mut self, index: usize) -> Episode {
        self.done.insert(index);
        let target = self.interactions.get(index);
        match self.solver.solve(&target) {
            SolveResult::Sat(model) => {
                let done = &self.done;
                let model = complete(&mut self.solver, &self.interactions, |i| !done.contains(i), target, model);
                self.accept(model);
                Episode::Pending
            }
            SolveResult::Unsat => {
                debug!("t-wise: {:?} is infeasible", target);
                self.infeasible.push(index);
                Episode::Pending
            }
            SolveResult::Unknown => {
                self.unresolved.push(index);
                Episode::Unresolved
            }
        }
    }

    fn refine(&mut self, iteration: usize) {
        let covers: Vec<Vec<usize>> = self.configs.iter().map(|c| self.interactions.covered_by(c)).collect();
        let mut counts: HashMap<usize, u32> = HashMap::new();
        for cover in &covers {
            for &i in cover {
                *counts.entry(i).or_default() += 1;
            }
        }

        let mut keep = vec![true; self.configs.len()];
        for (k, cover) in covers.iter().enumerate() {
            if cover.iter().all(|i| counts[i] >= 2) {
                keep[k] = false;
                for i in cover {
                    if let Some(c) = counts.get_mut(i) {
                        *c -= 1;
                    }
                }
            }
        }
        let redundant = keep.iter().filter(|&&k| !k).count();

        let mut yields: Vec<(usize, usize)> = (0..covers.len())
            .filter(|&k| keep[k])
            .map(|k| (covers[k].iter().filter(|i| counts[*i] == 1).count(), k))
            .collect();
        yields.sort_unstable();

        let mut replaced = 0;
        if yields.len() >= 2 {
            let removed = [yields[0].1, yields[1].1];
            let mut local: HashMap<usize, u32> = HashMap::new();
            for &r in &removed {
                for &i in &covers[r] {
                    *local.entry(i).or_default() += 1;
                }
            }
            let mut lost: Vec<usize> = local.iter().filter(|(i, n)| counts[*i] == **n).map(|(&i, _)| i).collect();
            lost.sort_unstable();
            lost.shuffle(&mut self.rng);

            if let Some(replacement) = self.recover(&lost) {
                if replacement.len() < removed.len() {
                    for &r in &removed {
                        keep[r] = false;
                    }
                    replaced = replacement.len();
                    let kept = std::mem::take(&mut self.configs).into_iter().zip(&keep).filter(|(_, &k)| k).map(|(c, _)| c);
                    self.configs = kept.chain(replacement).collect();
                    debug!("t-wise: iteration {}: replaced 2 configurations by {}", iteration, replaced);
                    return;
                }
            }
        }

        if redundant > 0 {
            let kept = std::mem::take(&mut self.configs).into_iter().zip(&keep).filter(|(_, &k)| k).map(|(c, _)| c);
            self.configs = kept.collect();
        }
        debug!(
            "t-wise: iteration {}: dropped {} redundant, replaced {}, {} configurations",
            iteration,
            redundant,
            replaced,
            self.configs.len()
        );
    }

    /// Covers `targets` (in the given order) with as few new configurations as the greedy finds.
    fn recover(&mut self, targets: &[usize]) -> Option<Vec<LiteralSet>> {
        let mut open: HashSet<usize> = targets.iter().copied().collect();
        let mut result = Vec::new();
        for &index in targets {
            if !open.contains(&index) {
                continue;
            }
            let target = self.interactions.get(index);
            let SolveResult::Sat(model) = self.solver.solve(&target) else {
                return None;
            };
            let model = complete(&mut self.solver, &self.interactions, |i| open.contains(&i), target, model);
            for i in self.interactions.covered_by(&model) {
                open.remove(&i);
            }
            result.push(model);
        }
        Some(result)
    }
}

/// Fixes the free variables of a configuration one at a time, ascending.
///
/// `assumptions` must be satisfiable and `model` one of its models. Each free variable takes the
/// literal that completes more `open` interactions with the literals fixed before it. A literal
/// the current model lacks is kept only if the solver finds a model containing it. Returns the
/// final model.
fn complete<P: crate::phase::PhaseSelection>(
    solver: &mut Solver<P>,
    interactions: &Interactions,
    open: impl Fn(usize) -> bool,
    mut assumptions: Vec<Lit>,
    mut model: LiteralSet,
) -> LiteralSet {
    let num_vars = solver.num_vars();
    let mut fixed = vec![false; num_vars];
    for lit in &assumptions {
        fixed[lit.var().index()] = true;
    }

    let mut solves = 0;
    for index in 0..num_vars {
        if fixed[index] {
            continue;
        }
        let var = Var::from_index(index);
        let (pos, neg) = (var.pos(), var.neg());
        let lit = if gain(interactions, &open, &assumptions, pos) > gain(interactions, &open, &assumptions, neg) {
            pos
        } else {
            neg
        };

        // The model is complete, so it holds either `lit` or its negation.
        let lit = if model.contains(lit) {
            lit
        } else if solves >= MAX_COMPLETION_SOLVES {
            -lit
        } else {
            solves += 1;
            assumptions.push(lit);
            let result = solver.solve(&assumptions);
            assumptions.pop();
            match result {
                SolveResult::Sat(m) => {
                    model = m;
                    lit
                }
                _ => -lit,
            }
        };
        fixed[index] = true;
        assumptions.push(lit);
    }
    model
}

/// Number of `open` interactions made of `lit` and `t - 1` of the `fixed` literals.
fn gain(interactions: &Interactions, open: &impl Fn(usize) -> bool, fixed: &[Lit], lit: Lit) -> usize {
    let k = interactions.strength() - 1;
    if k > fixed.len() {
        return 0;
    }
    let mut pick: Vec<usize> = (0..k).collect();
    let mut literals = Vec::with_capacity(k + 1);
    let mut count = 0;
    loop {
        literals.clear();
        literals.extend(pick.iter().map(|&i| fixed[i]));
        literals.push(lit);
        if interactions.index_of(&literals).is_some_and(|i| open(i)) {
            count += 1;
        }

        let Some(j) = (0..k).rev().find(|&j| pick[j] < fixed.len() - k + j) else {
            return count;
        };
        pick[j] += 1;
        for i in j + 1..k {
            pick[i] = pick[i - 1] + 1;
        }
    }
}

impl ConfigurationGenerator for TWise {
    fn name(&self) -> &'static str {
        "t-wise"
    }

    fn total_work(&self) -> Option<u64> {
        let configs = self.configs.len() as u64;
        match self.stage {
            Stage::Check | Stage::Construct { .. } => None,
            Stage::Refine { iteration } => {
                Some(self.steps + (self.iterations - iteration.min(self.iterations)) as u64 + configs + 1)
            }
            Stage::Emit { next } => Some(self.steps + configs - next as u64 + 1),
            Stage::Done => Some(self.steps + 1),
        }
    }

    fn step(&mut self) -> Result<Episode> {
        self.steps += 1;
        loop {
            match self.stage {
                Stage::Check => {
                    if let SolveResult::Unsat = self.solver.solve(&[]) {
                        info!("t-wise: constraints are unsatisfiable");
                        self.stage = Stage::Done;
                        return Ok(Episode::Exhausted);
                    }
                    self.stage = Stage::Construct { cursor: 0 };
                    return Ok(Episode::Pending);
                }
                Stage::Construct { cursor } => match self.done.next_clear(cursor) {
                    Some(index) => {
                        self.stage = Stage::Construct { cursor: index + 1 };
                        return Ok(self.construct(index));
                    }
                    None => {
                        info!(
                            "t-wise: constructed {} configurations ({} infeasible, {} unresolved interactions)",
                            self.configs.len(),
                            self.infeasible.len(),
                            self.unresolved.len()
                        );
                        self.stage = Stage::Refine { iteration: 1 };
                    }
                },
                Stage::Refine { iteration } => {
                    if iteration >= self.iterations {
                        self.stage = Stage::Emit { next: 0 };
                        continue;
                    }
                    self.refine(iteration);
                    self.stage = Stage::Refine { iteration: iteration + 1 };
                    return Ok(Episode::Pending);
                }
                Stage::Emit { next } => {
                    if let Some(config) = self.configs.get(next) {
                        self.stage = Stage::Emit { next: next + 1 };
                        return Ok(Episode::Accepted(config.clone()));
                    }
                    self.stage = Stage::Done;
                }
                Stage::Done => return Ok(Episode::Exhausted),
            }
        }
    }
}
