//! Solver collaborator contract and the bundled BDD backend.
//!
//! The explorer talks to a constraint solver only through [`SolverBackend`]
//! (which creates contexts) and [`SolverContext`] (a push/pop assertion stack
//! answering `check` and `model`). Static pre-seed constraints are added with
//! [`SolverContext::add_static`] right after creation, before any `push`.
//!
//! [`BddBackend`] implements the contract for boolean conditions: each pushed
//! literal is conjoined into a BDD, so every scope level keeps its own
//! canonical conjunction and `pop` is a truncation.

use std::collections::BTreeSet;

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::bdd::Bdd;
use crate::expr::Expr;
use crate::reference::Ref;
use crate::types::{Valuation, Var};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SatResult {
    Sat,
    Unsat,
    Unknown,
}

pub trait SolverContext {
    /// Assert a constraint below every scope. Only valid before the first push.
    fn add_static(&mut self, constraint: &Expr);

    /// Open a new scope asserting `literal`.
    fn push(&mut self, literal: &Expr);

    /// Drop the `count` innermost scopes.
    fn pop(&mut self, count: usize);

    /// Number of open scopes.
    fn depth(&self) -> usize;

    fn check(&mut self) -> SatResult;

    /// A model of the current assertions; only meaningful after a `Sat` check.
    fn model(&mut self) -> Option<Valuation>;
}

pub trait SolverBackend {
    type Context: SolverContext;

    fn create(&mut self) -> Self::Context;
}

/// Solver backend over boolean conditions, built on a BDD per context.
#[derive(Debug)]
pub struct BddBackend {
    node_budget: usize,
    rng: ChaCha8Rng,
}

impl BddBackend {
    /// Default number of BDD nodes a context may allocate for one query
    /// before answering `Unknown`.
    pub const DEFAULT_NODE_BUDGET: usize = 1 << 20;

    pub fn new(seed: u64) -> Self {
        Self::with_budget(seed, Self::DEFAULT_NODE_BUDGET)
    }

    pub fn with_budget(seed: u64, node_budget: usize) -> Self {
        Self {
            node_budget,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl SolverBackend for BddBackend {
    type Context = BddContext;

    fn create(&mut self) -> Self::Context {
        // Each context draws its own stream from the backend's seeded one.
        let rng = ChaCha8Rng::seed_from_u64(self.rng.random());
        BddContext::new(Bdd::new(self.node_budget), rng)
    }
}

#[derive(Debug)]
struct Frame {
    formula: Ref,
    vars: BTreeSet<Var>,
}

pub struct BddContext {
    bdd: Bdd,
    base: Frame,
    frames: Vec<Frame>,
    rng: ChaCha8Rng,
}

impl BddContext {
    fn new(bdd: Bdd, rng: ChaCha8Rng) -> Self {
        let base = Frame {
            formula: bdd.one,
            vars: BTreeSet::new(),
        };
        Self {
            bdd,
            base,
            frames: Vec::new(),
            rng,
        }
    }

    fn top(&self) -> &Frame {
        self.frames.last().unwrap_or(&self.base)
    }
}

impl SolverContext for BddContext {
    fn add_static(&mut self, constraint: &Expr) {
        assert!(self.frames.is_empty(), "Static constraints must be added before any push");
        let f = self.bdd.from_expr(constraint);
        self.base.formula = self.bdd.apply_and(self.base.formula, f);
        self.base.vars.extend(constraint.vars());
    }

    fn push(&mut self, literal: &Expr) {
        let f = self.bdd.from_expr(literal);
        let top = self.top();
        let formula = self.bdd.apply_and(top.formula, f);
        let mut vars = top.vars.clone();
        vars.extend(literal.vars());
        debug!("push: {} (depth {})", literal, self.frames.len() + 1);
        self.frames.push(Frame { formula, vars });
    }

    fn pop(&mut self, count: usize) {
        assert!(
            count <= self.frames.len(),
            "Cannot pop {} scopes from depth {}",
            count,
            self.frames.len()
        );
        self.frames.truncate(self.frames.len() - count);
    }

    fn depth(&self) -> usize {
        self.frames.len()
    }

    fn check(&mut self) -> SatResult {
        // The node budget covers the work done since the previous check.
        let exhausted = self.bdd.is_exhausted();
        self.bdd.restart_budget();
        if exhausted {
            return SatResult::Unknown;
        }
        if self.bdd.is_zero(self.top().formula) {
            SatResult::Unsat
        } else {
            SatResult::Sat
        }
    }

    fn model(&mut self) -> Option<Valuation> {
        let top = self.top();
        let (formula, vars) = (top.formula, top.vars.clone());
        let path = self.bdd.random_sat(formula, &mut self.rng)?;
        let mut valuation: Valuation = path.into_iter().collect();
        // Variables the path skips are unconstrained; pick them at random too.
        for var in vars {
            if valuation.get(var).is_none() {
                valuation.set(var, self.rng.random_bool(0.5));
            }
        }
        Some(valuation)
    }
}
