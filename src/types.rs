//! Type-safe wrappers for variables and literals.
//!
//! Variables are 1-indexed, literals are signed integers in DIMACS style:
//! the magnitude is the variable ID and the sign is the polarity.
use std::fmt;
use std::ops::Neg;

/// A variable identifier (1-indexed).
///
/// # Invariants
///
/// - Variable IDs must be >= 1 (0 is reserved as the "unset" marker)
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Creates a new variable with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id == 0`. Variables must be 1-indexed.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable IDs must be >= 1");
        Var(id)
    }

    /// Returns the raw variable ID as a `u32`.
    pub fn id(self) -> u32 {
        self.0
    }

    /// Returns the 0-based slot of this variable in an assignment array.
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Creates a variable from its 0-based slot in an assignment array.
    pub fn from_index(index: usize) -> Self {
        Var(index as u32 + 1)
    }

    /// Positive literal of this variable.
    pub fn pos(self) -> Lit {
        Lit(self.0 as i32)
    }

    /// Negative literal of this variable.
    pub fn neg(self) -> Lit {
        Lit(-(self.0 as i32))
    }

    /// Literal of this variable with the given polarity.
    pub fn lit(self, positive: bool) -> Lit {
        if positive {
            self.pos()
        } else {
            self.neg()
        }
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// A signed literal.
///
/// # Invariants
///
/// - The inner value is never 0
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Lit(i32);

impl Lit {
    /// Creates a literal from its DIMACS representation.
    ///
    /// # Panics
    ///
    /// Panics if `value == 0`.
    pub fn from_dimacs(value: i32) -> Self {
        assert_ne!(value, 0, "Literal must be non-zero");
        Lit(value)
    }

    /// Returns the signed DIMACS representation.
    pub fn to_dimacs(self) -> i32 {
        self.0
    }

    pub fn var(self) -> Var {
        Var(self.0.unsigned_abs())
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Neg for Lit {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Lit(-self.0)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "~")?;
        }
        write!(f, "{}", self.var())
    }
}

impl From<Lit> for i32 {
    fn from(lit: Lit) -> Self {
        lit.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_var_creation() {
        let v1 = Var::new(1);
        let v2 = Var::new(2);
        assert_eq!(v1.id(), 1);
        assert_eq!(v2.id(), 2);
        assert_eq!(v2.index(), 1);
        assert_eq!(Var::from_index(1), v2);
        assert!(v1 < v2);
    }

    #[test]
    #[should_panic(expected = "Variable IDs must be >= 1")]
    fn test_var_zero_panics() {
        Var::new(0);
    }

    #[test]
    #[should_panic(expected = "Literal must be non-zero")]
    fn test_lit_zero_panics() {
        Lit::from_dimacs(0);
    }

    #[test]
    fn test_lit_polarity() {
        let x = Var::new(3);
        assert_eq!(x.pos().to_dimacs(), 3);
        assert_eq!(x.neg().to_dimacs(), -3);
        assert!(x.pos().is_positive());
        assert!(x.neg().is_negative());
        assert_eq!(-x.pos(), x.neg());
        assert_eq!(x.neg().var(), x);
        assert_eq!(x.lit(false), x.neg());
    }

    #[test]
    fn test_lit_display() {
        assert_eq!(Lit::from_dimacs(2).to_string(), "x2");
        assert_eq!(Lit::from_dimacs(-7).to_string(), "~x7");
    }
}
