//! Type-safe wrappers for symbolic inputs.
//!
//! This module provides the small value types shared by every part of the
//! explorer: symbolic input variables, branch outcomes and valuations
//! (concrete assignments handed to the executor).

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Not;

use serde::{Deserialize, Serialize};

/// A symbolic input variable (1-indexed).
///
/// # Invariants
///
/// - Variable IDs must be >= 1 (0 is reserved for BDD terminals)
///
/// Deserialization enforces the same invariant, so a malformed trace is
/// rejected when it is parsed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Var(u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("Variable IDs must be >= 1")]
pub struct ZeroVarError;

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
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl TryFrom<u32> for Var {
    type Error = ZeroVarError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        if id == 0 {
            Err(ZeroVarError)
        } else {
            Ok(Var(id))
        }
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// Outcome of one evaluated branch condition.
///
/// The `True` slot is the left child of a decision node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    True,
    False,
}

impl Outcome {
    /// Both outcomes, in child-slot order.
    pub const ALL: [Outcome; 2] = [Outcome::True, Outcome::False];

    /// Child slot of this outcome in a decision node.
    pub const fn index(self) -> usize {
        match self {
            Outcome::True => 0,
            Outcome::False => 1,
        }
    }

    pub const fn from_bool(value: bool) -> Self {
        if value {
            Outcome::True
        } else {
            Outcome::False
        }
    }

    pub const fn as_bool(self) -> bool {
        matches!(self, Outcome::True)
    }
}

impl Not for Outcome {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Outcome::True => Outcome::False,
            Outcome::False => Outcome::True,
        }
    }
}

impl From<bool> for Outcome {
    fn from(value: bool) -> Self {
        Outcome::from_bool(value)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::True => write!(f, "T"),
            Outcome::False => write!(f, "F"),
        }
    }
}

/// A concrete assignment of values to symbolic input variables.
///
/// Variables missing from a valuation are left to the executor's default
/// (`false`).
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Valuation(BTreeMap<Var, bool>);

impl Valuation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, var: Var) -> Option<bool> {
        self.0.get(&var).copied()
    }

    /// Value of the variable, defaulting to `false` when unassigned.
    pub fn value(&self, var: Var) -> bool {
        self.get(var).unwrap_or(false)
    }

    pub fn set(&mut self, var: Var, value: bool) {
        self.0.insert(var, value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Var, bool)> + '_ {
        self.0.iter().map(|(&var, &value)| (var, value))
    }
}

impl FromIterator<(Var, bool)> for Valuation {
    fn from_iter<I: IntoIterator<Item = (Var, bool)>>(iter: I) -> Self {
        Valuation(iter.into_iter().collect())
    }
}

impl fmt::Display for Valuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", var, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_var_creation() {
        let v1 = Var::new(1);
        let v2 = Var::new(2);
        assert_eq!(v1.id(), 1);
        assert_eq!(v2.id(), 2);
        assert!(v1 < v2);
        assert_eq!(v2.to_string(), "x2");
    }

    #[test]
    #[should_panic(expected = "Variable IDs must be >= 1")]
    fn test_var_zero_panics() {
        Var::new(0);
    }

    #[test]
    fn test_outcome() {
        assert_eq!(!Outcome::True, Outcome::False);
        assert_eq!(!Outcome::False, Outcome::True);
        assert_eq!(Outcome::from_bool(true), Outcome::True);
        assert_eq!(Outcome::True.index(), 0);
        assert_eq!(Outcome::False.index(), 1);
        assert!(!Outcome::False.as_bool());
    }

    #[test]
    fn test_valuation_defaults() {
        let mut val = Valuation::new();
        assert!(val.is_empty());
        val.set(Var::new(2), true);
        assert_eq!(val.get(Var::new(2)), Some(true));
        assert_eq!(val.get(Var::new(1)), None);
        assert!(!val.value(Var::new(1)));
        assert_eq!(val.to_string(), "{x2=true}");
    }

    #[test]
    fn test_valuation_json() {
        let val: Valuation = [(Var::new(1), true), (Var::new(3), false)].into_iter().collect();
        let json = serde_json::to_string(&val).unwrap();
        assert_eq!(json, r#"{"1":true,"3":false}"#);
        let back: Valuation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, val);
    }

    #[test]
    fn test_zero_var_rejected_from_json() {
        assert_eq!(Var::try_from(0), Err(ZeroVarError));
        assert_eq!(Var::try_from(4), Ok(Var::new(4)));
        assert!(serde_json::from_str::<Var>("0").is_err());
        assert!(serde_json::from_str::<Valuation>(r#"{"0":true}"#).is_err());
        assert!(serde_json::from_str::<Valuation>(r#"{"1":true,"0":false}"#).is_err());
    }
}
