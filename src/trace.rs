//! Traces of concrete runs.
//!
//! A [`Trace`] is what the executor reports back for one valuation: the
//! ordered branch decisions the run took, and its final [`PathState`].
//!
//! On the wire, an executor prints its trace as one JSON object on a line of
//! standard output prefixed with [`TRACE_MARKER`]; everything else the target
//! prints is ignored:
//!
//! ```text
//! [TRACE] {"decisions":[{"condition":{"var":1},"outcome":"true"}],"state":{"state":"ok"}}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::expr::Expr;
use crate::path::PathState;
use crate::types::Outcome;

/// Line prefix marking the trace in executor output.
pub const TRACE_MARKER: &str = "[TRACE]";

/// One evaluated branch condition and the outcome the run took.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub condition: Expr,
    pub outcome: Outcome,
}

impl Decision {
    pub fn new(condition: Expr, outcome: impl Into<Outcome>) -> Self {
        Self {
            condition,
            outcome: outcome.into(),
        }
    }

    /// The literal this decision contributes to the path condition.
    pub fn literal(&self) -> Expr {
        self.condition.literal(self.outcome)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub decisions: Vec<Decision>,
    pub state: PathState,
}

impl Trace {
    pub fn new(decisions: Vec<Decision>, state: PathState) -> Self {
        Self { decisions, state }
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// Extracts the trace from raw executor output.
    ///
    /// Returns `Ok(None)` when no line carries the marker. When several do,
    /// the last one wins.
    pub fn parse(output: &str) -> Result<Option<Trace>> {
        let line = output
            .lines()
            .filter_map(|line| line.trim_start().strip_prefix(TRACE_MARKER))
            .last();
        match line {
            Some(json) => Ok(Some(serde_json::from_str(json.trim())?)),
            None => Ok(None),
        }
    }

    /// Renders the trace in the wire format understood by [`Trace::parse`].
    pub fn to_line(&self) -> Result<String> {
        Ok(format!("{} {}", TRACE_MARKER, serde_json::to_string(self)?))
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trace [")?;
        for (i, decision) in self.decisions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", decision.literal())?;
        }
        write!(f, "] -> {}", self.state)
    }
}
