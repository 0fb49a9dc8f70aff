//! Configurations as immutable assignment snapshots.

use std::fmt;

use crate::types::{Lit, Var};

/// A full or partial assignment of the feature variables.
///
/// Slot `var - 1` holds the signed literal assigned to `var`, or 0 when the variable is unset.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct LiteralSet {
    model: Box<[i32]>,
}

impl LiteralSet {
    /// Captures an assignment array (index = variable ID - 1, 0 = unset).
    pub fn from_model(model: Vec<i32>) -> Self {
        debug_assert!(
            model.iter().enumerate().all(|(i, &l)| l == 0 || l.unsigned_abs() as usize == i + 1),
            "model slot does not match its variable"
        );
        Self {
            model: model.into_boxed_slice(),
        }
    }

    /// Builds a configuration over `num_vars` variables from a list of DIMACS literals.
    pub fn from_dimacs(num_vars: usize, literals: impl IntoIterator<Item = i32>) -> Self {
        let mut model = vec![0; num_vars];
        for l in literals {
            let lit = Lit::from_dimacs(l);
            model[lit.var().index()] = l;
        }
        Self::from_model(model)
    }

    pub fn from_lits(num_vars: usize, literals: &[Lit]) -> Self {
        Self::from_dimacs(num_vars, literals.iter().map(|l| l.to_dimacs()))
    }

    /// Number of variables this configuration ranges over.
    pub fn num_vars(&self) -> usize {
        self.model.len()
    }

    /// The raw assignment array.
    pub fn model(&self) -> &[i32] {
        &self.model
    }

    /// The literal assigned to `var`, if any.
    pub fn get(&self, var: Var) -> Option<Lit> {
        match self.model.get(var.index()) {
            Some(&l) if l != 0 => Some(Lit::from_dimacs(l)),
            _ => None,
        }
    }

    /// Returns true if `lit` is assigned in this configuration.
    pub fn contains(&self, lit: Lit) -> bool {
        self.model.get(lit.var().index()) == Some(&lit.to_dimacs())
    }

    pub fn contains_all(&self, literals: &[Lit]) -> bool {
        literals.iter().all(|&l| self.contains(l))
    }

    /// Returns true if at least one of `literals` is assigned the opposite polarity.
    pub fn conflicts_with(&self, literals: &[Lit]) -> bool {
        literals.iter().any(|&l| self.contains(-l))
    }

    pub fn is_complete(&self) -> bool {
        self.model.iter().all(|&l| l != 0)
    }

    /// Iterates over the set literals in variable order.
    pub fn literals(&self) -> impl Iterator<Item = Lit> + '_ {
        self.model.iter().filter(|&&l| l != 0).map(|&l| Lit::from_dimacs(l))
    }

    /// The clause excluding exactly this configuration: the negation of all set literals.
    pub fn blocking_clause(&self) -> Vec<Lit> {
        self.literals().map(|l| -l).collect()
    }
}

impl fmt::Display for LiteralSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for l in self.literals() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}", l.to_dimacs())?;
            first = false;
        }
        Ok(())
    }
}
