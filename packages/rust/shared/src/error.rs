//! Error types for researchbrief.
//!
//! Library crates use [`BriefError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Per-source fetch failures are deliberately *not* errors: they travel as
//! `failure_reason` on the source reference so one bad URL never aborts
//! its siblings.

use std::path::PathBuf;

use crate::types::FailedSource;

/// Top-level error type for all researchbrief operations.
#[derive(Debug, thiserror::Error)]
pub enum BriefError {
    /// Configuration loading or validation error (including a missing or
    /// rejected provider API key).
    #[error("config error: {message}")]
    Config { message: String },

    /// The inbound URL list was rejected: bad count or bad syntax.
    /// `invalid` enumerates every offending entry, not just the first.
    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
        invalid: Vec<String>,
    },

    /// Every source in the batch failed extraction.
    #[error("could not extract content from any URL ({} failed)", failures.len())]
    ExtractionFailed { failures: Vec<FailedSource> },

    /// Provider credential problem. Non-retryable.
    #[error("auth error: {message}")]
    Auth { message: String },

    /// Brief generation failed after the retry budget was exhausted.
    #[error("generation failed: {message}")]
    GenerationFailed { message: String },

    /// Brief store read/write error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BriefError>;

impl BriefError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an invalid-input error with the list of offending entries.
    pub fn invalid_input(msg: impl Into<String>, invalid: Vec<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
            invalid,
        }
    }

    /// Create a generation-failed error from any displayable message.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::GenerationFailed {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
