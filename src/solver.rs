//! Backtracking search with phase selection hooks.
//!
//! The [`Solver`] is a small DPLL engine: two-watched-literal unit propagation, chronological
//! backtracking that flips the most recent unflipped decision, and solving under assumptions.
//! Its only job is to expose the hooks the generators need: every branching decision is taken
//! by the attached [`PhaseSelection`], and every assignment and retraction is reported to it.
//!
//! Each call to [`Solver::solve`] is a self-contained episode: it starts from the empty
//! assignment and retracts everything before returning, so the strategy always sees matching
//! `assign`/`undo` pairs.
//!
//! Clauses added with [`Solver::add_clause`] (e.g. blocking clauses) live in the solver and never
//! touch the shared [`Cnf`].

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};

use crate::cnf::Cnf;
use crate::literal_set::LiteralSet;
use crate::phase::PhaseSelection;
use crate::types::{Lit, Var};

/// Outcome of one solver episode.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SolveResult {
    Sat(LiteralSet),
    Unsat,
    /// The conflict budget ran out before a verdict was reached.
    Unknown,
}

impl SolveResult {
    pub fn is_sat(&self) -> bool {
        matches!(self, SolveResult::Sat(_))
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct SolverStats {
    pub solves: u64,
    pub decisions: u64,
    pub conflicts: u64,
    pub propagations: u64,
}

#[derive(Debug, Copy, Clone)]
struct Frame {
    trail_len: usize,
    lit: Lit,
    flipped: bool,
}

pub struct Solver<P: PhaseSelection> {
    cnf: Arc<Cnf>,
    clauses: Vec<Vec<Lit>>,
    units: Vec<Lit>,
    has_empty_clause: bool,
    /// Clause indices watching a literal, indexed by [`code`].
    watches: Vec<Vec<usize>>,
    values: Vec<i32>,
    order: Vec<Var>,
    trail: Vec<Lit>,
    frames: Vec<Frame>,
    qhead: usize,
    strategy: P,
    conflict_budget: Option<u64>,
    stats: SolverStats,
}

fn code(lit: Lit) -> usize {
    (lit.var().index() << 1) | lit.is_negative() as usize
}

impl<P: PhaseSelection> Solver<P> {
    pub fn new(cnf: Arc<Cnf>, strategy: P) -> Self {
        let num_vars = cnf.num_vars();
        let mut solver = Self {
            clauses: Vec::with_capacity(cnf.clauses().len()),
            units: Vec::new(),
            has_empty_clause: false,
            watches: vec![Vec::new(); 2 * num_vars],
            values: vec![0; num_vars],
            order: (0..num_vars).map(Var::from_index).collect(),
            trail: Vec::with_capacity(num_vars),
            frames: Vec::new(),
            qhead: 0,
            strategy,
            conflict_budget: None,
            stats: SolverStats::default(),
            cnf: Arc::clone(&cnf),
        };
        for clause in cnf.clauses() {
            solver.add_clause(clause.literals());
        }
        solver
    }

    pub fn cnf(&self) -> &Arc<Cnf> {
        &self.cnf
    }

    pub fn num_vars(&self) -> usize {
        self.values.len()
    }

    pub fn strategy(&self) -> &P {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut P {
        &mut self.strategy
    }

    /// Replaces the phase selection strategy, returning the old one.
    pub fn set_strategy(&mut self, strategy: P) -> P {
        debug_assert!(self.trail.is_empty());
        std::mem::replace(&mut self.strategy, strategy)
    }

    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    /// Limits the number of conflicts per episode; `None` means unlimited.
    pub fn set_conflict_budget(&mut self, budget: Option<u64>) {
        self.conflict_budget = budget;
    }

    /// Sets the order in which unassigned variables are branched on.
    ///
    /// # Panics
    ///
    /// Panics if `order` is not a permutation of all variables.
    pub fn set_order(&mut self, order: Vec<Var>) {
        let mut seen = vec![false; self.num_vars()];
        for v in &order {
            assert!(!std::mem::replace(&mut seen[v.index()], true), "Variable {} occurs twice in the order", v);
        }
        assert_eq!(order.len(), self.num_vars(), "Order must contain every variable");
        self.order = order;
    }

    /// Adds a clause to this solver only.
    ///
    /// Adding an empty clause makes every further episode unsatisfiable.
    pub fn add_clause(&mut self, literals: &[Lit]) {
        debug_assert!(self.trail.is_empty(), "clauses can only be added between episodes");
        match literals.len() {
            0 => self.has_empty_clause = true,
            1 => self.units.push(literals[0]),
            _ => {
                let index = self.clauses.len();
                self.watches[code(literals[0])].push(index);
                self.watches[code(literals[1])].push(index);
                self.clauses.push(literals.to_vec());
            }
        }
    }

    fn value(&self, lit: Lit) -> Option<bool> {
        match self.values[lit.var().index()] {
            0 => None,
            v => Some(v == lit.to_dimacs()),
        }
    }

    fn enqueue(&mut self, lit: Lit) {
        self.values[lit.var().index()] = lit.to_dimacs();
        self.trail.push(lit);
        self.strategy.assign(lit);
    }

    /// Propagates all pending trail literals. Returns false on conflict.
    fn propagate(&mut self) -> bool {
        while self.qhead < self.trail.len() {
            let falsified = -self.trail[self.qhead];
            self.qhead += 1;
            self.stats.propagations += 1;

            let watching = std::mem::take(&mut self.watches[code(falsified)]);
            let mut kept = Vec::with_capacity(watching.len());
            let mut conflict = false;

            for (pos, &ci) in watching.iter().enumerate() {
                if conflict {
                    kept.extend_from_slice(&watching[pos..]);
                    break;
                }

                if self.clauses[ci][0] == falsified {
                    self.clauses[ci].swap(0, 1);
                }
                let first = self.clauses[ci][0];
                if self.value(first) == Some(true) {
                    kept.push(ci);
                    continue;
                }

                let replacement = (2..self.clauses[ci].len()).find(|&k| self.value(self.clauses[ci][k]) != Some(false));
                if let Some(k) = replacement {
                    self.clauses[ci].swap(1, k);
                    let watch = self.clauses[ci][1];
                    self.watches[code(watch)].push(ci);
                    continue;
                }

                kept.push(ci);
                match self.value(first) {
                    Some(false) => conflict = true,
                    _ => self.enqueue(first),
                }
            }

            self.watches[code(falsified)] = kept;
            if conflict {
                return false;
            }
        }
        true
    }

    fn backtrack_to(&mut self, trail_len: usize) {
        while self.trail.len() > trail_len {
            if let Some(lit) = self.trail.pop() {
                self.values[lit.var().index()] = 0;
                self.strategy.undo(lit.var());
            }
        }
        self.qhead = self.qhead.min(trail_len);
    }

    fn reset(&mut self) {
        self.backtrack_to(0);
        self.frames.clear();
    }

    fn next_unassigned(&self) -> Option<Var> {
        self.order.iter().copied().find(|v| self.values[v.index()] == 0)
    }

    /// Assigns `lit` at the root of the episode.
    fn assume(&mut self, lit: Lit) -> bool {
        match self.value(lit) {
            Some(value) => value,
            None => {
                self.enqueue(lit);
                self.propagate()
            }
        }
    }

    /// Runs one search episode under the given assumptions.
    pub fn solve(&mut self, assumptions: &[Lit]) -> SolveResult {
        self.stats.solves += 1;
        trace!("solve(assumptions = {:?})", assumptions);

        let result = self.search(assumptions);
        self.reset();

        debug!(
            "solve #{} -> {}",
            self.stats.solves,
            match &result {
                SolveResult::Sat(_) => "SAT",
                SolveResult::Unsat => "UNSAT",
                SolveResult::Unknown => "UNKNOWN",
            }
        );
        result
    }

    fn search(&mut self, assumptions: &[Lit]) -> SolveResult {
        if self.has_empty_clause {
            return SolveResult::Unsat;
        }
        for i in 0..self.units.len() {
            let unit = self.units[i];
            if !self.assume(unit) {
                return SolveResult::Unsat;
            }
        }
        for &lit in assumptions {
            if !self.assume(lit) {
                return SolveResult::Unsat;
            }
        }

        let mut conflicts = 0u64;
        loop {
            let Some(var) = self.next_unassigned() else {
                return SolveResult::Sat(LiteralSet::from_model(self.values.clone()));
            };

            self.stats.decisions += 1;
            let lit = self.strategy.select(var);
            debug_assert_eq!(lit.var(), var, "strategy returned a literal of another variable");
            self.frames.push(Frame {
                trail_len: self.trail.len(),
                lit,
                flipped: false,
            });
            self.enqueue(lit);

            while !self.propagate() {
                self.stats.conflicts += 1;
                conflicts += 1;
                if self.conflict_budget.is_some_and(|budget| conflicts > budget) {
                    return SolveResult::Unknown;
                }

                loop {
                    let Some(frame) = self.frames.pop() else {
                        return SolveResult::Unsat;
                    };
                    self.backtrack_to(frame.trail_len);
                    if !frame.flipped {
                        self.frames.push(Frame {
                            flipped: true,
                            lit: -frame.lit,
                            ..frame
                        });
                        self.enqueue(-frame.lit);
                        break;
                    }
                }
            }
        }
    }
}

impl<P: PhaseSelection> fmt::Debug for Solver<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("num_vars", &self.num_vars())
            .field("clauses", &(self.clauses.len() + self.units.len()))
            .field("strategy", &self.strategy.name())
            .field("stats", &self.stats)
            .finish()
    }
}
