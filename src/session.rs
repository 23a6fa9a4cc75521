//! Solver session: turns path conditions into valuations.
//!
//! In non-incremental mode every query gets a fresh context. In incremental
//! mode one context lives across queries and its scope stack mirrors the
//! literals currently asserted, identified by `(decision node, outcome)`.
//! Moving to a new target pops back to the longest common prefix and pushes
//! only the remainder.

use log::{debug, warn};

use crate::expr::Expr;
use crate::solver::{SatResult, SolverBackend, SolverContext};
use crate::tree::{NodeId, PathLiteral};
use crate::types::{Outcome, Valuation};

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Solution {
    Sat(Valuation),
    Unsat,
    Unknown,
}

/// Counters of solver work.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SessionStats {
    pub contexts: usize,
    pub checks: usize,
    pub pushes: usize,
    pub pops: usize,
}

pub struct SolverSession<B: SolverBackend> {
    backend: B,
    statics: Vec<Expr>,
    incremental: bool,
    context: Option<B::Context>,
    asserted: Vec<(NodeId, Outcome)>,
    stats: SessionStats,
}

impl<B: SolverBackend> SolverSession<B> {
    pub fn new(backend: B, statics: Vec<Expr>, incremental: bool) -> Self {
        Self {
            backend,
            statics,
            incremental,
            context: None,
            asserted: Vec::new(),
            stats: SessionStats::default(),
        }
    }

    pub fn is_incremental(&self) -> bool {
        self.incremental
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Identities of the literals asserted in the live context (incremental mode).
    pub fn asserted(&self) -> &[(NodeId, Outcome)] {
        &self.asserted
    }

    fn create_context(&mut self) -> B::Context {
        let mut context = self.backend.create();
        for constraint in &self.statics {
            context.add_static(constraint);
        }
        self.stats.contexts += 1;
        context
    }

    /// Decide the conjunction of `path` together with the static constraints.
    pub fn solve(&mut self, path: &[PathLiteral]) -> Solution {
        if self.incremental {
            self.solve_incremental(path)
        } else {
            self.solve_fresh(path)
        }
    }

    fn solve_fresh(&mut self, path: &[PathLiteral]) -> Solution {
        let mut context = self.create_context();
        for lit in path {
            context.push(&lit.literal);
        }
        self.stats.pushes += path.len();
        self.query(&mut context)
    }

    fn solve_incremental(&mut self, path: &[PathLiteral]) -> Solution {
        let mut context = match self.context.take() {
            Some(context) => context,
            None => {
                self.asserted.clear();
                self.create_context()
            }
        };

        let common = self
            .asserted
            .iter()
            .zip(path)
            .take_while(|(asserted, lit)| asserted.0 == lit.node && asserted.1 == lit.outcome)
            .count();
        let stale = self.asserted.len() - common;
        if stale > 0 {
            context.pop(stale);
            self.asserted.truncate(common);
            self.stats.pops += stale;
        }
        for lit in &path[common..] {
            context.push(&lit.literal);
            self.asserted.push((lit.node, lit.outcome));
        }
        self.stats.pushes += path.len() - common;
        debug!(
            "solve: reused {} of {} literals, popped {}",
            common,
            path.len(),
            stale
        );
        debug_assert_eq!(context.depth(), self.asserted.len());

        let solution = self.query(&mut context);
        if solution == Solution::Unknown {
            // The context may be in a degraded state; start over next time.
            self.asserted.clear();
        } else {
            self.context = Some(context);
        }
        solution
    }

    fn query(&mut self, context: &mut B::Context) -> Solution {
        self.stats.checks += 1;
        match context.check() {
            SatResult::Sat => match context.model() {
                Some(valuation) => Solution::Sat(valuation),
                None => {
                    warn!("solver reported sat but produced no model");
                    Solution::Unknown
                }
            },
            SatResult::Unsat => Solution::Unsat,
            SatResult::Unknown => Solution::Unknown,
        }
    }
}
