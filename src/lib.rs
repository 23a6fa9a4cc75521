//! # dse-rs: Dynamic Symbolic Execution in Rust
//!
//! **`dse-rs`** explores the execution paths of a target program by running it
//! on concrete inputs, recording which branches each run took, and asking a
//! constraint solver for inputs that flip an untaken branch.
//!
//! ## How it works
//!
//! Every run reports a [`Trace`][crate::trace::Trace]: the branch conditions it
//! evaluated, the outcome taken at each, and how the run ended. Traces are
//! merged into one [`DecisionTree`][crate::tree::DecisionTree], whose untaken
//! slots are *open leaves*. The [`Explorer`][crate::explorer::Explorer] picks an
//! open leaf according to a [`Strategy`][crate::strategy::Strategy], conjoins
//! the literals on its path, and solves them. A satisfying valuation is the
//! next input; an unsatisfiable path is closed as infeasible and never run.
//! Exploration ends when the root is closed, or earlier on a configured
//! [`Termination`][crate::path::Termination] condition.
//!
//! ## Basic Usage
//!
//! ```rust
//! use dse::config::Config;
//! use dse::dse::{Context, Dse, StopReason};
//! use dse::expr::Expr;
//! use dse::path::PathState;
//! use dse::trace::{Decision, Trace};
//! use dse::types::{Valuation, Var};
//!
//! // The target: `if x1 { if x2 { ... } }`, reporting its own trace.
//! let program = |v: &Valuation| -> Option<Trace> {
//!     let x1 = v.value(Var::new(1));
//!     let mut decisions = vec![Decision::new(Expr::var(1), x1)];
//!     if x1 {
//!         decisions.push(Decision::new(Expr::var(2), v.value(Var::new(2))));
//!     }
//!     Some(Trace::new(decisions, PathState::Ok))
//! };
//!
//! let ctx = Context::new(Config { seed: Some(42), ..Config::default() });
//! let mut dse = Dse::from_context(&ctx, program).unwrap();
//! let analysis = dse.run().unwrap();
//!
//! assert_eq!(analysis.stop, StopReason::Exhausted);
//! assert_eq!(analysis.executions, 3);
//! ```
//!
//! ## Core Components
//!
//! - **[`tree`]**: The decision tree, merging, closing and path conditions.
//! - **[`explorer`]** and **[`strategy`]**: Leaf selection and the solve/merge cycle.
//! - **[`solver`]** and **[`session`]**: The solver contract and (incremental) solving.
//! - **[`bdd`]**: The BDD manager behind the bundled solver backend.
//! - **[`dse`]**: The driver loop and the final analysis.

pub mod bdd;
pub mod config;
pub mod dot;
pub mod dse;
pub mod error;
pub mod executor;
pub mod explorer;
pub mod expr;
pub mod path;
pub mod reference;
pub mod sat;
pub mod session;
pub mod solver;
pub mod strategy;
pub mod trace;
pub mod tree;
pub mod types;
