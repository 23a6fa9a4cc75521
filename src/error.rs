//! Error types for the explorer and its driver.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DseError {
    /// A merged trace disagrees with structure already recorded in the tree.
    ///
    /// This means the target behaved non-deterministically, which invalidates
    /// the accumulated tree; the search cannot continue.
    #[error("inconsistent trace at depth {depth}: {message}")]
    Inconsistent { depth: usize, message: String },

    /// Invalid or missing configuration, detected before exploring.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = DseError> = std::result::Result<T, E>;
