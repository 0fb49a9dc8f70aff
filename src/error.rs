//! Error types for configuration sampling.

use thiserror::Error;

/// Result type alias for sampling operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading constraints or setting up a generator.
///
/// Solver timeouts are not errors: they are reported per episode and only
/// turn a run into [`GenerationState::Failed`][crate::generator::GenerationState::Failed]
/// once the tolerance is exceeded.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid generator parameters or unknown algorithm name
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Clause or variable table rejected outside of any input file
    #[error("invalid constraints: {0}")]
    InvalidConstraint(String),

    /// Malformed or inconsistent constraint input
    #[error("cannot load constraints (line {line}): {message}")]
    ConstraintLoad { line: usize, message: String },

    /// Underlying I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Failure of an out-of-process covering array tool
    #[error("external tool failed: {0}")]
    External(String),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub(crate) fn constraint(message: impl Into<String>) -> Self {
        Error::InvalidConstraint(message.into())
    }

    pub(crate) fn load(line: usize, message: impl Into<String>) -> Self {
        Error::ConstraintLoad {
            line,
            message: message.into(),
        }
    }
}
