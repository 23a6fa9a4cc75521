//! The explorer: alternates between handing out valuations and folding the
//! resulting traces into the decision tree.
//!
//! [`Explorer::next_valuation`] only talks to the solver: it selects open
//! leaves by [`Strategy`], closing infeasible and undecidable ones, until one
//! is satisfiable. [`Explorer::add_trace`] then merges the trace of that run.
//! The executor itself is driven from outside (see [`crate::dse`]).

use log::{debug, info, warn};

use crate::error::Result;
use crate::path::{PathResult, PathState};
use crate::session::{SessionStats, Solution, SolverSession};
use crate::solver::SolverBackend;
use crate::strategy::{OpenSet, Strategy};
use crate::trace::Trace;
use crate::tree::{DecisionTree, Leaf, NodeId};
use crate::types::Valuation;

/// Counters of exploration work.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ExplorerStats {
    /// Valuations handed out.
    pub valuations: usize,
    /// Traces merged (or missing traces recorded).
    pub traces: usize,
    /// Leaves closed because their path condition is unsatisfiable.
    pub infeasible: usize,
    /// Leaves closed because the solver could not decide them.
    pub unknown: usize,
    /// Runs that did not reach the leaf they were solved for.
    pub diverged: usize,
}

#[derive(Debug, Clone)]
struct Target {
    leaf: NodeId,
    valuation: Valuation,
}

pub struct Explorer<B: SolverBackend> {
    tree: DecisionTree,
    open: OpenSet,
    strategy: Strategy,
    session: SolverSession<B>,
    target: Option<Target>,
    stats: ExplorerStats,
}

impl<B: SolverBackend> Explorer<B> {
    pub fn new(strategy: Strategy, session: SolverSession<B>) -> Self {
        let tree = DecisionTree::new();
        let mut open = OpenSet::new();
        open.insert(tree.root());
        Self {
            tree,
            open,
            strategy,
            session,
            target: None,
            stats: ExplorerStats::default(),
        }
    }

    pub fn tree(&self) -> &DecisionTree {
        &self.tree
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn stats(&self) -> ExplorerStats {
        self.stats
    }

    pub fn is_incremental(&self) -> bool {
        self.session.is_incremental()
    }

    pub fn session_stats(&self) -> SessionStats {
        self.session.stats()
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.tree.is_exhausted()
    }

    /// Leaf the last handed-out valuation was solved for, until its trace arrives.
    pub fn target(&self) -> Option<NodeId> {
        self.target.as_ref().map(|t| t.leaf)
    }

    /// Next valuation to execute, or `None` once the tree is exhausted.
    ///
    /// Leaves whose path condition is unsatisfiable are closed as
    /// [`Leaf::Infeasible`]; leaves the solver cannot decide are closed as
    /// `DontKnow`. Neither is ever handed out.
    pub fn next_valuation(&mut self) -> Option<Valuation> {
        if let Some(stale) = self.target.take() {
            warn!("valuation for {} was never followed by a trace", stale.leaf);
            self.resolve(stale.leaf, Leaf::Done(PathResult::dont_know()));
        }

        loop {
            let Some(leaf) = self.strategy.select(&self.open, &self.tree) else {
                info!("exploration exhausted after {} valuations", self.stats.valuations);
                return None;
            };
            debug_assert!(self.tree.is_open_leaf(leaf));

            let path = self.tree.path_condition(leaf);
            match self.session.solve(&path) {
                Solution::Sat(valuation) => {
                    debug!("next: {} at depth {} with {}", leaf, path.len(), valuation);
                    self.stats.valuations += 1;
                    self.target = Some(Target {
                        leaf,
                        valuation: valuation.clone(),
                    });
                    return Some(valuation);
                }
                Solution::Unsat => {
                    debug!("next: {} is infeasible", leaf);
                    self.stats.infeasible += 1;
                    self.resolve(leaf, Leaf::Infeasible);
                }
                Solution::Unknown => {
                    warn!("next: solver could not decide {}", leaf);
                    self.stats.unknown += 1;
                    self.resolve(leaf, Leaf::Done(PathResult::dont_know()));
                }
            }
        }
    }

    /// Record the outcome of running the last handed-out valuation.
    ///
    /// `None` means the executor produced no trace; the target leaf is closed
    /// as `DontKnow`. Returns the leaf that now holds the run's classification.
    ///
    /// # Panics
    ///
    /// Panics if `trace` is `None` and no valuation is pending.
    pub fn add_trace(&mut self, trace: Option<&Trace>) -> Result<NodeId> {
        let target = self.target.take();
        let valuation = target.as_ref().map(|t| t.valuation.clone()).unwrap_or_default();
        self.stats.traces += 1;

        let Some(trace) = trace else {
            let Some(target) = target else {
                panic!("Missing trace reported without a pending valuation");
            };
            warn!("no trace obtained for {}", target.leaf);
            self.resolve(target.leaf, Leaf::Done(PathResult::new(PathState::DontKnow, Some(valuation))));
            return Ok(target.leaf);
        };

        let merge = self.tree.merge(trace, &valuation)?;
        if let Some(filled) = merge.filled {
            self.open.remove(filled);
        }
        for &id in &merge.discovered {
            self.open.insert(id);
        }

        if let Some(target) = target {
            if merge.leaf != target.leaf && self.tree.is_open_leaf(target.leaf) {
                warn!(
                    "run diverged: solved for {} but ended in {}; closing {} as unknown",
                    target.leaf, merge.leaf, target.leaf
                );
                self.stats.diverged += 1;
                self.resolve(target.leaf, Leaf::Done(PathResult::dont_know()));
            }
        }
        Ok(merge.leaf)
    }

    fn resolve(&mut self, leaf: NodeId, with: Leaf) {
        self.tree.close(leaf, with);
        self.open.remove(leaf);
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::expr::Expr;
    use crate::solver::BddBackend;
    use crate::trace::Decision;
    use crate::types::Var;

    fn explorer(strategy: Strategy) -> Explorer<BddBackend> {
        Explorer::new(strategy, SolverSession::new(BddBackend::new(5), vec![], false))
    }

    /// `if x1 { if x2 {} }` as a trace.
    fn run(v: &Valuation) -> Trace {
        let x1 = v.value(Var::new(1));
        let mut decisions = vec![Decision::new(Expr::var(1), x1)];
        if x1 {
            decisions.push(Decision::new(Expr::var(2), v.value(Var::new(2))));
        }
        Trace::new(decisions, PathState::Ok)
    }

    #[test]
    fn test_explores_to_exhaustion() {
        let mut explorer = explorer(Strategy::Dfs);
        let mut runs = 0;
        while let Some(v) = explorer.next_valuation() {
            explorer.add_trace(Some(&run(&v))).unwrap();
            runs += 1;
        }
        assert_eq!(runs, 3);
        assert!(explorer.is_exhausted());
        assert_eq!(explorer.open_count(), 0);
        assert_eq!(explorer.tree().census().ok, 3);
        assert!(explorer.tree().check_well_formed().is_ok());
    }

    #[test]
    fn test_missing_trace_closes_target() {
        let mut explorer = explorer(Strategy::Bfs);
        explorer.next_valuation().unwrap();
        let root = explorer.target().unwrap();
        assert_eq!(explorer.add_trace(None).unwrap(), root);
        assert!(explorer.is_exhausted());
        assert_eq!(explorer.tree().census().dont_know, 1);
        assert_eq!(explorer.next_valuation(), None);
    }

    #[test]
    fn test_unanswered_valuation_closes_target() {
        let mut explorer = explorer(Strategy::Dfs);
        let v = explorer.next_valuation().unwrap();
        explorer.add_trace(Some(&run(&v))).unwrap();

        // The second valuation is handed out but its run never reported.
        let v = explorer.next_valuation().unwrap();
        let stale = explorer.target().unwrap();
        assert!(v.value(Var::new(1)));

        assert_eq!(explorer.next_valuation(), None);
        assert_eq!(explorer.target(), None);
        assert!(!explorer.tree().is_open_leaf(stale));
        assert_eq!(explorer.tree().result(stale).map(|r| r.state()), Some(&PathState::DontKnow));
        assert_eq!(explorer.tree().census().dont_know, 1);
        assert_eq!(explorer.stats().valuations, 2);
        assert!(explorer.is_exhausted());
    }

    #[test]
    fn test_divergence_closes_target() {
        let mut explorer = explorer(Strategy::Dfs);
        let v = explorer.next_valuation().unwrap();
        explorer.add_trace(Some(&run(&v))).unwrap();

        // Whatever is solved next, report the same run as the first one.
        explorer.next_valuation().unwrap();
        let target = explorer.target().unwrap();
        let leaf = explorer.add_trace(Some(&run(&v))).unwrap();
        assert_ne!(leaf, target);
        assert_eq!(explorer.stats().diverged, 1);
        assert!(!explorer.tree().is_open_leaf(target));
        assert!(explorer.tree().check_well_formed().is_ok());
    }

    #[test]
    fn test_inconsistency_propagates() {
        let mut explorer = explorer(Strategy::Dfs);
        let v = explorer.next_valuation().unwrap();
        explorer.add_trace(Some(&run(&v))).unwrap();

        explorer.next_valuation().unwrap();
        let bogus = Trace::new(vec![Decision::new(Expr::var(9), true)], PathState::Ok);
        assert!(explorer.add_trace(Some(&bogus)).is_err());
    }
}
