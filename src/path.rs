//! Classification of finished paths.
//!
//! Every concrete run ends in one [`PathState`]: it completed (`Ok`), was cut
//! short on purpose (`Abort`), failed with an uncaught error (`Error`), or its
//! outcome could not be determined (`DontKnow`). A [`PathResult`] pairs the
//! state with the valuation that produced it.
//!
//! [`Termination`] decides which error classes stop the whole search early.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DseError;
use crate::types::Valuation;

/// Error category reported for violated assertions.
pub const ASSERTION_CATEGORY: &str = "assertion";
/// Error category reported for explicitly flagged bugs.
pub const BUG_CATEGORY: &str = "bug";
/// Error category reported for taint violations.
pub const TAINT_CATEGORY: &str = "taint";

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PathState {
    Ok,
    Abort { reason: String },
    Error { category: String, diagnostic: String },
    DontKnow,
}

impl PathState {
    pub fn is_error(&self) -> bool {
        matches!(self, PathState::Error { .. })
    }
}

impl fmt::Display for PathState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathState::Ok => write!(f, "OK"),
            PathState::Abort { reason } => write!(f, "ABORT: {}", reason),
            PathState::Error { category, .. } => write!(f, "ERROR: {}", category),
            PathState::DontKnow => write!(f, "DONT_KNOW"),
        }
    }
}

/// A classified path together with the valuation that produced it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PathResult {
    state: PathState,
    valuation: Option<Valuation>,
}

impl PathResult {
    pub fn new(state: PathState, valuation: Option<Valuation>) -> Self {
        Self { state, valuation }
    }

    pub fn ok(valuation: Valuation) -> Self {
        Self::new(PathState::Ok, Some(valuation))
    }

    pub fn abort(valuation: Valuation, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(PathState::Abort { reason }, Some(valuation))
    }

    pub fn error(valuation: Valuation, category: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        let state = PathState::Error {
            category: category.into(),
            diagnostic: diagnostic.into(),
        };
        Self::new(state, Some(valuation))
    }

    pub fn dont_know() -> Self {
        Self::new(PathState::DontKnow, None)
    }

    pub fn state(&self) -> &PathState {
        &self.state
    }

    pub fn valuation(&self) -> Option<&Valuation> {
        self.valuation.as_ref()
    }
}

impl fmt::Display for PathResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.state)?;
        if let Some(valuation) = &self.valuation {
            write!(f, " {}", valuation)?;
        }
        Ok(())
    }
}

/// Error class that may stop the search early.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Category {
    /// An error with the assertion category.
    Assertion,
    /// Any error.
    Error,
    /// An error with the bug category.
    Bug,
    /// An error with the taint category.
    Taint,
}

impl Category {
    pub fn matches(self, state: &PathState) -> bool {
        let PathState::Error { category, .. } = state else {
            return false;
        };
        match self {
            Category::Assertion => category == ASSERTION_CATEGORY,
            Category::Error => true,
            Category::Bug => category == BUG_CATEGORY,
            Category::Taint => category == TAINT_CATEGORY,
        }
    }
}

/// Set of categories that halt the search as soon as a path matches one.
///
/// The empty set means "run to completion".
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Termination {
    categories: Vec<Category>,
}

impl Termination {
    pub fn completion() -> Self {
        Self::default()
    }

    pub fn on(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut termination = Self::default();
        for category in categories {
            termination.insert(category);
        }
        termination
    }

    pub fn insert(&mut self, category: Category) {
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
    }

    pub fn is_completion(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Whether a path in the given state should stop the search.
    pub fn matches(&self, state: &PathState) -> bool {
        self.categories.iter().any(|c| c.matches(state))
    }
}

impl FromStr for Termination {
    type Err = DseError;

    /// Parses `|`-separated flags: `assertion`, `error`, `bug`, `taint`, `completion`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut termination = Termination::completion();
        for flag in s.split('|').map(str::trim).filter(|flag| !flag.is_empty()) {
            match flag.to_lowercase().as_str() {
                "assertion" => termination.insert(Category::Assertion),
                "error" => termination.insert(Category::Error),
                "bug" => termination.insert(Category::Bug),
                "taint" => termination.insert(Category::Taint),
                "completion" => {}
                _ => return Err(DseError::Config(format!("unsupported termination flag: {}", flag))),
            }
        }
        Ok(termination)
    }
}
