//! Boolean constraint expressions.
//!
//! Branch conditions recorded by the executor, path-condition literals and
//! static pre-seed constraints are all [`Expr`] values. The explorer treats
//! them as opaque handles (compared by structural equality); only the solver
//! backend looks inside.
//!
//! Expressions serialize to JSON with one key per operator:
//!
//! ```text
//! {"var": 1}
//! {"not": {"var": 1}}
//! {"and": [{"var": 1}, {"const": false}]}
//! {"ite": [{"var": 1}, {"var": 2}, {"var": 3}]}
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

use serde::{Deserialize, Serialize};

use crate::types::{Outcome, Valuation, Var};

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expr {
    Const(bool),
    Var(Var),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Xor(Box<Expr>, Box<Expr>),
    Implies(Box<Expr>, Box<Expr>),
    Ite(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn constant(value: bool) -> Self {
        Expr::Const(value)
    }

    /// Variable with the given (1-based) ID.
    pub fn var(id: u32) -> Self {
        Expr::Var(Var::new(id))
    }

    /// Negation, folding constants and double negations.
    pub fn negate(self) -> Self {
        match self {
            Expr::Const(value) => Expr::Const(!value),
            Expr::Not(inner) => *inner,
            e => Expr::Not(Box::new(e)),
        }
    }

    pub fn and(lhs: Self, rhs: Self) -> Self {
        Expr::And(vec![lhs, rhs])
    }

    pub fn or(lhs: Self, rhs: Self) -> Self {
        Expr::Or(vec![lhs, rhs])
    }

    pub fn xor(lhs: Self, rhs: Self) -> Self {
        Expr::Xor(Box::new(lhs), Box::new(rhs))
    }

    pub fn implies(lhs: Self, rhs: Self) -> Self {
        Expr::Implies(Box::new(lhs), Box::new(rhs))
    }

    pub fn ite(cond: Self, then: Self, else_: Self) -> Self {
        Expr::Ite(Box::new(cond), Box::new(then), Box::new(else_))
    }

    /// Conjunction of all the given expressions (`true` when empty).
    pub fn conjunction(exprs: impl IntoIterator<Item = Expr>) -> Self {
        let mut exprs: Vec<Expr> = exprs.into_iter().collect();
        match exprs.len() {
            0 => Expr::Const(true),
            1 => exprs.remove(0),
            _ => Expr::And(exprs),
        }
    }

    /// The literal asserting that this condition evaluated to `outcome`.
    pub fn literal(&self, outcome: Outcome) -> Self {
        match outcome {
            Outcome::True => self.clone(),
            Outcome::False => self.clone().negate(),
        }
    }

    /// Evaluates the expression, treating unassigned variables as `false`.
    pub fn eval(&self, valuation: &Valuation) -> bool {
        match self {
            Expr::Const(value) => *value,
            Expr::Var(var) => valuation.value(*var),
            Expr::Not(e) => !e.eval(valuation),
            Expr::And(es) => es.iter().all(|e| e.eval(valuation)),
            Expr::Or(es) => es.iter().any(|e| e.eval(valuation)),
            Expr::Xor(a, b) => a.eval(valuation) ^ b.eval(valuation),
            Expr::Implies(a, b) => !a.eval(valuation) || b.eval(valuation),
            Expr::Ite(c, t, e) => {
                if c.eval(valuation) {
                    t.eval(valuation)
                } else {
                    e.eval(valuation)
                }
            }
        }
    }

    /// All variables occurring in the expression.
    pub fn vars(&self) -> BTreeSet<Var> {
        let mut vars = BTreeSet::new();
        self.collect_vars(&mut vars);
        vars
    }

    fn collect_vars(&self, vars: &mut BTreeSet<Var>) {
        match self {
            Expr::Const(_) => {}
            Expr::Var(var) => {
                vars.insert(*var);
            }
            Expr::Not(e) => e.collect_vars(vars),
            Expr::And(es) | Expr::Or(es) => {
                for e in es {
                    e.collect_vars(vars);
                }
            }
            Expr::Xor(a, b) | Expr::Implies(a, b) => {
                a.collect_vars(vars);
                b.collect_vars(vars);
            }
            Expr::Ite(c, t, e) => {
                c.collect_vars(vars);
                t.collect_vars(vars);
                e.collect_vars(vars);
            }
        }
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Self::Output {
        self.negate()
    }
}

impl BitAnd for Expr {
    type Output = Expr;

    fn bitand(self, rhs: Self) -> Self::Output {
        Expr::and(self, rhs)
    }
}

impl BitOr for Expr {
    type Output = Expr;

    fn bitor(self, rhs: Self) -> Self::Output {
        Expr::or(self, rhs)
    }
}

impl BitXor for Expr {
    type Output = Expr;

    fn bitxor(self, rhs: Self) -> Self::Output {
        Expr::xor(self, rhs)
    }
}

impl From<Var> for Expr {
    fn from(var: Var) -> Self {
        Expr::Var(var)
    }
}

fn fmt_nary(f: &mut fmt::Formatter<'_>, es: &[Expr], op: &str, empty: &str) -> fmt::Result {
    if es.is_empty() {
        return write!(f, "{}", empty);
    }
    write!(f, "(")?;
    for (i, e) in es.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", op)?;
        }
        write!(f, "{}", e)?;
    }
    write!(f, ")")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(value) => write!(f, "{}", value),
            Expr::Var(var) => write!(f, "{}", var),
            Expr::Not(e) => write!(f, "!{}", e),
            Expr::And(es) => fmt_nary(f, es, "&", "true"),
            Expr::Or(es) => fmt_nary(f, es, "|", "false"),
            Expr::Xor(a, b) => write!(f, "({} ^ {})", a, b),
            Expr::Implies(a, b) => write!(f, "({} -> {})", a, b),
            Expr::Ite(c, t, e) => write!(f, "ite({}, {}, {})", c, t, e),
        }
    }
}
