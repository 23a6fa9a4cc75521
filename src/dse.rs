//! The exploration driver.
//!
//! [`Dse::run`] is the single-threaded loop `select valuation -> execute ->
//! merge`, repeated until the tree is exhausted, a run matches the
//! termination policy, or the iteration bound is reached. It returns an
//! [`Analysis`] of everything seen.

use std::fmt;

use log::{debug, info};
use rand::Rng;

use crate::config::Config;
use crate::error::Result;
use crate::executor::Executor;
use crate::explorer::{Explorer, ExplorerStats};
use crate::path::{PathState, Termination};
use crate::session::{SessionStats, SolverSession};
use crate::solver::{BddBackend, SolverBackend};
use crate::strategy::Strategy;
use crate::tree::{Census, DecisionTree, NodeId};
use crate::types::Valuation;

/// Configuration together with the resolved reproducibility seed.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub seed: u64,
}

impl Context {
    /// Resolve the seed (configured, or freshly drawn) and log it.
    pub fn new(config: Config) -> Self {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        info!("Random seed: {}", seed);
        Self { config, seed }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StopReason {
    /// Every path was resolved.
    Exhausted,
    /// A run matched the termination policy; its leaf is attached.
    Terminated { leaf: NodeId },
    /// The configured number of executions was reached.
    IterationLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Exhausted => write!(f, "exhausted"),
            StopReason::Terminated { leaf } => write!(f, "terminated at {}", leaf),
            StopReason::IterationLimit => write!(f, "iteration limit"),
        }
    }
}

/// An error leaf found during exploration.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ErrorPath {
    pub leaf: NodeId,
    pub category: String,
    pub diagnostic: String,
    pub valuation: Option<Valuation>,
}

/// Summary of an exploration run.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Analysis {
    pub strategy: Strategy,
    pub stop: StopReason,
    pub executions: usize,
    pub census: Census,
    pub errors: Vec<ErrorPath>,
    pub explorer: ExplorerStats,
    pub incremental: bool,
    pub solver: SessionStats,
}

impl Analysis {
    fn collect<B: SolverBackend>(explorer: &Explorer<B>, stop: StopReason, executions: usize) -> Self {
        Self {
            strategy: explorer.strategy(),
            stop,
            executions,
            census: explorer.tree().census(),
            errors: error_paths(explorer.tree()),
            explorer: explorer.stats(),
            incremental: explorer.is_incremental(),
            solver: explorer.session_stats(),
        }
    }
}

fn error_paths(tree: &DecisionTree) -> Vec<ErrorPath> {
    tree.nodes()
        .filter_map(|(id, _)| {
            let result = tree.result(id)?;
            let PathState::Error { category, diagnostic } = result.state() else {
                return None;
            };
            Some(ErrorPath {
                leaf: id,
                category: category.clone(),
                diagnostic: diagnostic.clone(),
                valuation: result.valuation().cloned(),
            })
        })
        .collect()
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.census;
        writeln!(f, "== Analysis ({}, {})", self.strategy, self.stop)?;
        writeln!(f, "executions: {}", self.executions)?;
        writeln!(f, "decisions:  {}", c.decisions)?;
        writeln!(
            f,
            "paths:      ok={} abort={} error={} dont_know={} infeasible={} open={}",
            c.ok, c.abort, c.error, c.dont_know, c.infeasible, c.open
        )?;
        writeln!(
            f,
            "solver:     {} contexts={} checks={} pushes={} pops={}",
            if self.incremental { "incremental" } else { "fresh" },
            self.solver.contexts, self.solver.checks, self.solver.pushes, self.solver.pops
        )?;
        if self.explorer.diverged > 0 {
            writeln!(f, "diverged:   {}", self.explorer.diverged)?;
        }
        if !self.errors.is_empty() {
            writeln!(f, "errors:")?;
            for e in &self.errors {
                write!(f, "  {} {}", e.leaf, e.category)?;
                if !e.diagnostic.is_empty() {
                    write!(f, " ({})", e.diagnostic)?;
                }
                if let Some(valuation) = &e.valuation {
                    write!(f, " {}", valuation)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

pub struct Dse<B: SolverBackend, E: Executor> {
    explorer: Explorer<B>,
    executor: E,
    termination: Termination,
    max_iterations: Option<usize>,
    executions: usize,
}

impl<E: Executor> Dse<BddBackend, E> {
    /// Build a driver over the bundled BDD backend, seeded from `ctx`.
    pub fn from_context(ctx: &Context, executor: E) -> Result<Self> {
        let config = &ctx.config;
        let statics = config.load_statics()?;
        let backend = BddBackend::with_budget(ctx.seed, config.node_budget);
        let session = SolverSession::new(backend, statics, config.incremental);
        let explorer = Explorer::new(config.strategy, session);
        Ok(Self::new(explorer, executor, config.termination.clone(), config.max_iterations))
    }
}

impl<B: SolverBackend, E: Executor> Dse<B, E> {
    pub fn new(explorer: Explorer<B>, executor: E, termination: Termination, max_iterations: Option<usize>) -> Self {
        Self {
            explorer,
            executor,
            termination,
            max_iterations,
            executions: 0,
        }
    }

    pub fn explorer(&self) -> &Explorer<B> {
        &self.explorer
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executions(&self) -> usize {
        self.executions
    }

    /// Explore until a stop condition is met.
    ///
    /// Fails only if a run's trace contradicts the tree built so far.
    pub fn run(&mut self) -> Result<Analysis> {
        let stop = loop {
            if self.max_iterations.is_some_and(|max| self.executions >= max) {
                info!("stopping after {} executions", self.executions);
                break StopReason::IterationLimit;
            }

            let Some(valuation) = self.explorer.next_valuation() else {
                break StopReason::Exhausted;
            };

            let trace = self.executor.execute(&valuation);
            self.executions += 1;
            match &trace {
                Some(trace) => info!("{} on {}", trace, valuation),
                None => info!("== no trace obtained for {}", valuation),
            }

            let leaf = self.explorer.add_trace(trace.as_ref())?;
            debug!("run: execution {} recorded at {}", self.executions, leaf);

            if let Some(trace) = &trace {
                if self.termination.matches(&trace.state) {
                    info!("terminating on {} at {}", trace.state, leaf);
                    break StopReason::Terminated { leaf };
                }
            }
        };
        Ok(Analysis::collect(&self.explorer, stop, self.executions))
    }
}
