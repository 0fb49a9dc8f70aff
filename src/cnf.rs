//! Constraint sets in conjunctive normal form.
//!
//! A [`Cnf`] is built once (usually by the [`dimacs`][crate::dimacs] reader) and then shared
//! read-only between all generator runs, typically behind an `Arc`.

use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::literal_set::LiteralSet;
use crate::types::{Lit, Var};

/// A disjunction of literals over distinct variables.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Clause {
    literals: Box<[Lit]>,
}

impl Clause {
    /// Creates a clause from DIMACS literals.
    ///
    /// Fails on empty clauses, zero literals and repeated variables.
    pub fn new(literals: impl IntoIterator<Item = i32>) -> Result<Self> {
        let mut lits: Vec<Lit> = Vec::new();
        for value in literals {
            if value == 0 {
                return Err(Error::constraint("literal 0 inside a clause"));
            }
            let lit = Lit::from_dimacs(value);
            if lits.iter().any(|l| l.var() == lit.var()) {
                return Err(Error::constraint(format!("variable {} occurs twice in a clause", lit.var())));
            }
            lits.push(lit);
        }
        if lits.is_empty() {
            return Err(Error::constraint("empty clause"));
        }
        Ok(Self {
            literals: lits.into_boxed_slice(),
        })
    }

    pub fn literals(&self) -> &[Lit] {
        &self.literals
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Returns true if at least one literal of the clause is set in `config`.
    pub fn is_satisfied_by(&self, config: &LiteralSet) -> bool {
        self.literals.iter().any(|&lit| config.contains(lit))
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, lit) in self.literals.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", lit)?;
        }
        write!(f, ")")
    }
}

/// An immutable conjunction of clauses plus the variable name table.
#[derive(Debug, Clone)]
pub struct Cnf {
    names: Vec<String>,
    index: HashMap<String, Var>,
    clauses: Vec<Clause>,
}

impl Cnf {
    /// Creates a CNF over `names.len()` variables.
    ///
    /// Variable `i` (1-based) is named `names[i - 1]`.
    /// Fails if any clause mentions a variable outside `1..=names.len()`.
    pub fn new(names: Vec<String>, clauses: Vec<Clause>) -> Result<Self> {
        let num_vars = names.len();
        for (i, clause) in clauses.iter().enumerate() {
            if let Some(lit) = clause.literals().iter().find(|l| l.var().index() >= num_vars) {
                return Err(Error::constraint(format!(
                    "clause #{} references {} but only {} variables exist",
                    i + 1,
                    lit.var(),
                    num_vars
                )));
            }
        }

        let mut index = HashMap::with_capacity(num_vars);
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), Var::from_index(i)).is_some() {
                return Err(Error::constraint(format!("duplicate variable name '{}'", name)));
            }
        }

        Ok(Self { names, index, clauses })
    }

    /// Creates a CNF with default names `x1..xN` from raw DIMACS clauses.
    pub fn from_dimacs_clauses<I, C>(num_vars: usize, clauses: I) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator<Item = i32>,
    {
        let names = (1..=num_vars).map(|i| format!("x{}", i)).collect();
        let clauses = clauses.into_iter().map(Clause::new).collect::<Result<Vec<_>>>()?;
        Cnf::new(names, clauses)
    }

    pub fn num_vars(&self) -> usize {
        self.names.len()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, var: Var) -> &str {
        &self.names[var.index()]
    }

    pub fn var_by_name(&self, name: &str) -> Option<Var> {
        self.index.get(name).copied()
    }

    pub fn variables(&self) -> impl Iterator<Item = Var> {
        (0..self.num_vars()).map(Var::from_index)
    }

    /// Returns true if every clause is satisfied by `config`.
    ///
    /// Unset variables never satisfy a literal, so partial configurations only pass
    /// when the set literals alone satisfy all clauses.
    pub fn is_satisfied_by(&self, config: &LiteralSet) -> bool {
        self.clauses.iter().all(|c| c.is_satisfied_by(config))
    }
}
