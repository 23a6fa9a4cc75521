//! Shared fixtures: synthetic target programs and a solver backend that
//! records every query.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use dse::expr::Expr;
use dse::path::PathState;
use dse::solver::{BddBackend, BddContext, SatResult, SolverBackend, SolverContext};
use dse::trace::{Decision, Trace};
use dse::types::{Outcome, Valuation, Var};
use rand::Rng;

// ─── Programs ──────────────────────────────────────────────────────────────────

/// A target program as a tree of branches over boolean inputs.
#[derive(Debug, Clone)]
pub enum Program {
    Branch {
        condition: Expr,
        then: Box<Program>,
        otherwise: Box<Program>,
    },
    End(PathState),
}

impl Program {
    pub fn branch(condition: Expr, then: Program, otherwise: Program) -> Self {
        Program::Branch {
            condition,
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn ok() -> Self {
        Program::End(PathState::Ok)
    }

    pub fn error(category: &str) -> Self {
        Program::End(PathState::Error {
            category: category.to_string(),
            diagnostic: String::new(),
        })
    }

    /// Run the program, recording every branch it takes.
    pub fn run(&self, valuation: &Valuation) -> Trace {
        let mut decisions = Vec::new();
        let mut current = self;
        loop {
            match current {
                Program::Branch {
                    condition,
                    then,
                    otherwise,
                } => {
                    let taken = condition.eval(valuation);
                    decisions.push(Decision::new(condition.clone(), taken));
                    current = if taken { then } else { otherwise };
                }
                Program::End(state) => return Trace::new(decisions, state.clone()),
            }
        }
    }

    /// Complete binary tree testing `x1`, then `x2`, ... down to `x{depth}`.
    pub fn full(depth: u32) -> Self {
        fn build(level: u32, depth: u32) -> Program {
            if level > depth {
                return Program::ok();
            }
            Program::branch(Expr::var(level), build(level + 1, depth), build(level + 1, depth))
        }
        build(1, depth)
    }

    /// Random program over `vars` inputs, with conditions that may contradict
    /// the branches above them.
    pub fn random<R: Rng>(rng: &mut R, vars: u32, depth: u32) -> Self {
        if depth == 0 || rng.random_bool(0.2) {
            return match rng.random_range(0..4) {
                0 => Program::error("assertion"),
                1 => Program::End(PathState::Abort {
                    reason: "bound".to_string(),
                }),
                _ => Program::ok(),
            };
        }
        let condition = random_expr(rng, vars, 2);
        let then = Program::random(rng, vars, depth - 1);
        let otherwise = Program::random(rng, vars, depth - 1);
        Program::branch(condition, then, otherwise)
    }
}

pub fn random_expr<R: Rng>(rng: &mut R, vars: u32, depth: u32) -> Expr {
    if depth == 0 || rng.random_bool(0.4) {
        let x = Expr::var(rng.random_range(1..=vars));
        return if rng.random_bool(0.5) { x } else { !x };
    }
    let a = random_expr(rng, vars, depth - 1);
    let b = random_expr(rng, vars, depth - 1);
    match rng.random_range(0..4) {
        0 => Expr::and(a, b),
        1 => Expr::or(a, b),
        2 => Expr::xor(a, b),
        _ => Expr::implies(a, b),
    }
}

/// Every valuation of `x1..=x{vars}`.
pub fn all_valuations(vars: u32) -> Vec<Valuation> {
    (0..1u32 << vars)
        .map(|bits| (1..=vars).map(|i| (Var::new(i), bits >> (i - 1) & 1 == 1)).collect())
        .collect()
}

/// The outcome sequence of a trace, as a comparable key.
pub fn outcomes(trace: &Trace) -> Vec<Outcome> {
    trace.decisions.iter().map(|d| d.outcome).collect()
}

/// An executor that runs `program` and remembers every input it was given.
pub fn recording(program: Program, calls: Rc<RefCell<Vec<Valuation>>>) -> impl FnMut(&Valuation) -> Option<Trace> {
    move |v: &Valuation| {
        calls.borrow_mut().push(v.clone());
        Some(program.run(v))
    }
}

// ─── Recording solver ──────────────────────────────────────────────────────────

/// One `check` call: the scoped literals at that moment and the answer.
#[derive(Debug, Clone)]
pub struct Query {
    pub literals: Vec<Expr>,
    pub result: SatResult,
}

pub type QueryLog = Rc<RefCell<Vec<Query>>>;

/// [`BddBackend`] wrapper logging every query its contexts answer.
pub struct RecordingBackend {
    inner: BddBackend,
    undecided: Rc<Vec<Vec<Expr>>>,
    pub log: QueryLog,
}

impl RecordingBackend {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: BddBackend::new(seed),
            undecided: Rc::default(),
            log: QueryLog::default(),
        }
    }

    /// Answer `Unknown` whenever exactly these literals are in scope.
    pub fn undecided(mut self, literals: Vec<Expr>) -> Self {
        Rc::make_mut(&mut self.undecided).push(literals);
        self
    }
}

pub struct RecordingContext {
    inner: BddContext,
    stack: Vec<Expr>,
    undecided: Rc<Vec<Vec<Expr>>>,
    log: QueryLog,
}

impl SolverBackend for RecordingBackend {
    type Context = RecordingContext;

    fn create(&mut self) -> Self::Context {
        RecordingContext {
            inner: self.inner.create(),
            stack: Vec::new(),
            undecided: Rc::clone(&self.undecided),
            log: Rc::clone(&self.log),
        }
    }
}

impl SolverContext for RecordingContext {
    fn add_static(&mut self, constraint: &Expr) {
        self.inner.add_static(constraint);
    }

    fn push(&mut self, literal: &Expr) {
        self.stack.push(literal.clone());
        self.inner.push(literal);
    }

    fn pop(&mut self, count: usize) {
        self.stack.truncate(self.stack.len() - count);
        self.inner.pop(count);
    }

    fn depth(&self) -> usize {
        self.inner.depth()
    }

    fn check(&mut self) -> SatResult {
        let result = if self.undecided.contains(&self.stack) {
            SatResult::Unknown
        } else {
            self.inner.check()
        };
        self.log.borrow_mut().push(Query {
            literals: self.stack.clone(),
            result,
        });
        result
    }

    fn model(&mut self) -> Option<Valuation> {
        self.inner.model()
    }
}
