//! Reduced ordered BDD manager backing the bundled solver.
//!
//! Path-condition literals are boolean [`Expr`] formulas; the manager compiles
//! them into canonical BDDs, so satisfiability is a constant-time check
//! against the `zero` terminal and models are read off any path to `one`.
//!
//! The manager uses complement edges: a [`Ref`] carries a negation bit and the
//! high edge of every stored node is regular. A single terminal node (index 0)
//! represents `one`; `zero` is its complement.
//!
//! Node allocation is bounded by a *budget*, counted from the last
//! [`Bdd::restart_budget`]. Exceeding it does not fail the current operation,
//! but marks the manager as exhausted so that the solver answers `Unknown`
//! instead of trusting a result built past the bound.

use std::cell::{Cell, RefCell};
use std::cmp::min;
use std::collections::HashMap;
use std::fmt::Debug;

use log::debug;

use crate::expr::Expr;
use crate::reference::Ref;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct Node {
    variable: u32,
    low: Ref,
    high: Ref,
}

pub struct Bdd {
    nodes: RefCell<Vec<Node>>,
    unique: RefCell<HashMap<Node, u32>>,
    cache: RefCell<HashMap<(Ref, Ref, Ref), Ref>>,
    budget: usize,
    mark: Cell<usize>,
    exhausted: Cell<bool>,
    pub zero: Ref,
    pub one: Ref,
}

impl Bdd {
    /// Create a manager that may allocate up to `budget` decision nodes.
    pub fn new(budget: usize) -> Self {
        assert!(budget > 0, "Node budget should be positive");

        let one = Ref::positive(0);
        let terminal = Node {
            variable: 0,
            low: one,
            high: one,
        };

        Self {
            nodes: RefCell::new(vec![terminal]),
            unique: RefCell::new(HashMap::new()),
            cache: RefCell::new(HashMap::new()),
            budget,
            mark: Cell::new(1),
            exhausted: Cell::new(false),
            zero: -one,
            one,
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new(1 << 20)
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bdd")
            .field("size", &self.size())
            .field("budget", &self.budget)
            .field("exhausted", &self.exhausted.get())
            .finish()
    }
}

impl Bdd {
    /// Number of allocated decision nodes (the terminal is not counted).
    pub fn size(&self) -> usize {
        self.nodes.borrow().len() - 1
    }

    /// Whether the node budget has been exceeded since the last restart.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted.get()
    }

    /// Start a new budget window at the current size and clear exhaustion.
    pub fn restart_budget(&self) {
        self.mark.set(self.nodes.borrow().len());
        self.exhausted.set(false);
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == self.zero
    }
    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        node.index() == 0
    }

    pub fn variable(&self, node: Ref) -> u32 {
        self.nodes.borrow()[node.index()].variable
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.nodes.borrow()[node.index()].low;
        if node.is_negated() {
            -low
        } else {
            low
        }
    }
    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.nodes.borrow()[node.index()].high;
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");

        // Handle canonicity
        if high.is_negated() {
            return -self.mk_node(v, -low, -high);
        }

        // Handle duplicates
        if low == high {
            return low;
        }

        let node = Node { variable: v, low, high };
        if let Some(&i) = self.unique.borrow().get(&node) {
            return Ref::positive(i);
        }

        let mut nodes = self.nodes.borrow_mut();
        let i = nodes.len() as u32;
        nodes.push(node);
        if nodes.len() > self.mark.get() + self.budget && !self.exhausted.get() {
            debug!("mk: node budget of {} exceeded", self.budget);
            self.exhausted.set(true);
        }
        self.unique.borrow_mut().insert(node, i);
        Ref::positive(i)
    }

    pub fn mk_var(&self, v: u32) -> Ref {
        self.mk_node(v, self.zero, self.one)
    }

    pub fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        if self.is_terminal(node) || v < self.variable(node) {
            return (node, node);
        }
        debug_assert_eq!(v, self.variable(node));
        (self.low_node(node), self.high_node(node))
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(x, y, z) = (x ∧ y) ∨ (¬x ∧ z)
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,G,~F) => ite(F,G,1)
        let g = if g == f {
            self.one
        } else if g == -f {
            self.zero
        } else {
            g
        };
        let h = if h == f {
            self.zero
        } else if h == -f {
            self.one
        } else {
            h
        };

        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }

        // ite(~F,G,H) => ite(F,H,G)
        let (f, g, h) = if f.is_negated() { (-f, h, g) } else { (f, g, h) };

        // ite(F,~G,H) => ~ite(F,G,~H)
        let (g, h, n) = if g.is_negated() { (-g, -h, true) } else { (g, h, false) };

        let key = (f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return if n { -res } else { res };
        }

        // Determine the top variable:
        let mut m = self.variable(f);
        for r in [g, h] {
            if !self.is_terminal(r) {
                m = min(m, self.variable(r));
            }
        }

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.apply_ite(f0, g0, h0);
        let t = self.apply_ite(f1, g1, h1);
        let res = self.mk_node(m, e, t);

        self.cache.borrow_mut().insert(key, res);
        if n {
            -res
        } else {
            res
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }
    pub fn apply_and(&self, f: Ref, g: Ref) -> Ref {
        self.apply_ite(f, g, self.zero)
    }
    pub fn apply_or(&self, f: Ref, g: Ref) -> Ref {
        self.apply_ite(f, self.one, g)
    }
    pub fn apply_xor(&self, f: Ref, g: Ref) -> Ref {
        self.apply_ite(f, -g, g)
    }
    pub fn apply_imply(&self, f: Ref, g: Ref) -> Ref {
        self.apply_ite(f, g, self.one)
    }

    /// Compile a constraint expression into a BDD.
    pub fn from_expr(&self, expr: &Expr) -> Ref {
        match expr {
            Expr::Const(true) => self.one,
            Expr::Const(false) => self.zero,
            Expr::Var(var) => self.mk_var(var.id()),
            Expr::Not(e) => self.apply_not(self.from_expr(e)),
            Expr::And(es) => es.iter().fold(self.one, |acc, e| self.apply_and(acc, self.from_expr(e))),
            Expr::Or(es) => es.iter().fold(self.zero, |acc, e| self.apply_or(acc, self.from_expr(e))),
            Expr::Xor(a, b) => self.apply_xor(self.from_expr(a), self.from_expr(b)),
            Expr::Implies(a, b) => self.apply_imply(self.from_expr(a), self.from_expr(b)),
            Expr::Ite(c, t, e) => self.apply_ite(self.from_expr(c), self.from_expr(t), self.from_expr(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_var() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);

        assert_eq!(bdd.variable(x), 1);
        assert_eq!(bdd.high_node(x), bdd.one);
        assert_eq!(bdd.low_node(x), bdd.zero);
        assert_eq!(bdd.high_node(-x), bdd.zero);
        assert_eq!(bdd.low_node(-x), bdd.one);
    }

    #[test]
    fn test_terminal() {
        let bdd = Bdd::default();

        assert!(bdd.is_terminal(bdd.zero));
        assert!(bdd.is_terminal(bdd.one));
        assert!(bdd.is_zero(-bdd.one));
        assert_eq!(bdd.size(), 0);
    }

    #[test]
    fn test_and_or_canonical() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);

        assert_eq!(bdd.apply_and(x, y), bdd.apply_and(y, x));
        assert_eq!(bdd.apply_or(x, y), -bdd.apply_and(-x, -y));
        assert_eq!(bdd.apply_and(x, -x), bdd.zero);
        assert_eq!(bdd.apply_or(x, -x), bdd.one);
        assert_eq!(bdd.apply_xor(x, x), bdd.zero);
        assert_eq!(bdd.apply_imply(x, x), bdd.one);
    }

    #[test]
    fn test_ite() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let z = bdd.mk_var(3);

        let f = bdd.apply_ite(x, y, z);
        let expected = bdd.apply_or(bdd.apply_and(x, y), bdd.apply_and(-x, z));
        assert_eq!(f, expected);
        assert_eq!(bdd.top_cofactors(f, 1), (z, y));
    }

    #[test]
    fn test_from_expr() {
        let bdd = Bdd::default();

        let e = Expr::and(Expr::var(1), Expr::implies(Expr::var(1), Expr::var(2)));
        let f = bdd.from_expr(&e);
        assert_eq!(f, bdd.apply_and(bdd.mk_var(1), bdd.mk_var(2)));

        let contradiction = Expr::and(Expr::var(1), !Expr::var(1));
        assert!(bdd.is_zero(bdd.from_expr(&contradiction)));

        assert!(bdd.is_one(bdd.from_expr(&Expr::And(vec![]))));
        assert!(bdd.is_zero(bdd.from_expr(&Expr::Or(vec![]))));
    }

    #[test]
    fn test_budget_exhaustion() {
        let bdd = Bdd::new(2);

        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        assert!(!bdd.is_exhausted());

        let _ = bdd.apply_and(x, y);
        assert!(bdd.is_exhausted());
    }

    #[test]
    fn test_budget_restart() {
        let bdd = Bdd::new(2);
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        bdd.restart_budget();
        assert!(!bdd.is_exhausted());

        // Two more nodes fit into the new window, a third does not.
        let xy = bdd.apply_and(x, y);
        let _ = bdd.mk_var(3);
        assert!(!bdd.is_exhausted());
        let _ = bdd.apply_and(xy, bdd.mk_var(3));
        assert!(bdd.is_exhausted());

        bdd.restart_budget();
        assert!(!bdd.is_exhausted());
    }
}
