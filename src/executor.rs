//! Executor collaborator: runs the target under a valuation.
//!
//! Any `FnMut(&Valuation) -> Option<Trace>` is an [`Executor`], which is how
//! tests and embedders drive in-process programs. [`ProcessExecutor`] runs an
//! external command instead, passing the valuation as a JSON argument and
//! reading the trace back from its standard output.

use std::process::Command;

use log::{debug, warn};

use crate::config::Config;
use crate::error::{DseError, Result};
use crate::trace::Trace;
use crate::types::Valuation;

pub trait Executor {
    /// Run the target on `valuation`. `None` means no usable trace was obtained.
    fn execute(&mut self, valuation: &Valuation) -> Option<Trace>;
}

impl<F> Executor for F
where
    F: FnMut(&Valuation) -> Option<Trace>,
{
    fn execute(&mut self, valuation: &Valuation) -> Option<Trace> {
        self(valuation)
    }
}

/// Runs `program args.. <valuation-json>` once per valuation.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: String,
    args: Vec<String>,
}

impl ProcessExecutor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let program = config
            .executor
            .clone()
            .ok_or_else(|| DseError::Config("no executor configured (dse.executor)".to_string()))?;
        Ok(Self::new(program, config.executor_args.clone()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn run(&self, valuation: &Valuation) -> Result<Option<Trace>> {
        let input = serde_json::to_string(valuation)?;
        debug!("exec: {} {:?} {}", self.program, self.args, input);
        let output = Command::new(&self.program).args(&self.args).arg(&input).output()?;
        if !output.status.success() {
            debug!("exec: target exited with {}", output.status);
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Trace::parse(&stdout)
    }
}

impl Executor for ProcessExecutor {
    fn execute(&mut self, valuation: &Valuation) -> Option<Trace> {
        match self.run(valuation) {
            Ok(Some(trace)) => Some(trace),
            Ok(None) => {
                warn!("exec: {} printed no trace for {}", self.program, valuation);
                None
            }
            Err(e) => {
                warn!("exec: {} failed for {}: {}", self.program, valuation, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::expr::Expr;
    use crate::path::PathState;
    use crate::trace::Decision;
    use crate::types::{Outcome, Var};

    #[test]
    fn test_closure_executor() {
        let mut calls = 0;
        let mut exec = |v: &Valuation| {
            calls += 1;
            let decision = Decision::new(Expr::var(1), v.value(Var::new(1)));
            Some(Trace::new(vec![decision], PathState::Ok))
        };
        let trace = exec.execute(&Valuation::new()).unwrap();
        assert_eq!(trace.decisions[0].outcome, Outcome::False);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_from_config_requires_program() {
        let config = Config::default();
        assert!(matches!(ProcessExecutor::from_config(&config), Err(DseError::Config(_))));

        let config = Config {
            executor: Some("target".to_string()),
            executor_args: vec!["-q".to_string()],
            ..Config::default()
        };
        let exec = ProcessExecutor::from_config(&config).unwrap();
        assert_eq!(exec.program(), "target");
        assert_eq!(exec.args(), &["-q".to_string()]);
    }

    #[test]
    fn test_missing_program_gives_no_trace() {
        let mut exec = ProcessExecutor::new("/nonexistent/dse-target", vec![]);
        assert_eq!(exec.execute(&Valuation::new()), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_process_trace() {
        let line = r#"[TRACE] {"decisions":[{"condition":{"var":1},"outcome":"true"}],"state":{"state":"ok"}}"#;
        let script = format!("echo noise; echo '{}'", line);
        let mut exec = ProcessExecutor::new("sh", vec!["-c".to_string(), script]);
        let trace = exec.execute(&Valuation::new()).unwrap();
        assert_eq!(trace.decisions, vec![Decision::new(Expr::var(1), true)]);
        assert_eq!(trace.state, PathState::Ok);
    }

    #[cfg(unix)]
    #[test]
    fn test_process_trace_with_zero_var_is_dropped() {
        let line = r#"[TRACE] {"decisions":[{"condition":{"var":0},"outcome":"true"}],"state":{"state":"ok"}}"#;
        let script = format!("echo '{}'", line);
        let mut exec = ProcessExecutor::new("sh", vec!["-c".to_string(), script]);
        assert!(exec.run(&Valuation::new()).is_err());
        assert_eq!(exec.execute(&Valuation::new()), None);
    }
}
