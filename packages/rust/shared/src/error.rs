//! Error types for KnowledgeHarvest.
//!
//! Batch-level failures use [`HarvestError`] via `thiserror`. Per-source
//! extraction failures are data, not errors: they travel inside an
//! extraction outcome as a [`FailureReason`] and never abort a run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level error type for batch-level KnowledgeHarvest operations.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// Submitted run has no sources and no uploaded documents.
    #[error("invalid batch: {message}")]
    InvalidBatch { message: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Internal invariant violation while assembling the final result.
    #[error("aggregation error: {0}")]
    Aggregation(String),

    /// Data validation error (schema mismatch, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, HarvestError>;

impl HarvestError {
    /// Create an invalid-batch error from any displayable message.
    pub fn invalid_batch(msg: impl Into<String>) -> Self {
        Self::InvalidBatch {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
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

// ---------------------------------------------------------------------------
// FailureReason
// ---------------------------------------------------------------------------

/// Structured reason for a single source's extraction failure.
///
/// Recorded in the source's outcome and surfaced in the per-source trace;
/// a failure here never stops the rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// Network/HTTP error while fetching the source.
    #[error("network error: {0}")]
    Network(String),

    /// HTML or document parsing error.
    #[error("parse error: {0}")]
    Parse(String),

    /// Per-source deadline expired.
    #[error("timed out after {0}s")]
    Timeout(u64),

    /// Run was cancelled before this source completed.
    #[error("cancelled")]
    Cancelled,

    /// No extraction strategy can handle this source.
    #[error("unsupported source: {0}")]
    Unsupported(String),
}

impl FailureReason {
    /// Whether this failure was caused by run cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = HarvestError::invalid_batch("no sources given");
        assert_eq!(err.to_string(), "invalid batch: no sources given");

        let err = HarvestError::validation("title must not be empty");
        assert!(err.to_string().contains("title must not be empty"));
    }

    #[test]
    fn failure_reason_display() {
        let reason = FailureReason::Network("connection refused".into());
        assert_eq!(reason.to_string(), "network error: connection refused");

        let reason = FailureReason::Timeout(30);
        assert_eq!(reason.to_string(), "timed out after 30s");
    }

    #[test]
    fn failure_reason_roundtrip() {
        let reason = FailureReason::Parse("missing h1".into());
        let json = serde_json::to_string(&reason).expect("serialize");
        let parsed: FailureReason = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(reason, parsed);
    }

    #[test]
    fn cancelled_is_cancelled() {
        assert!(FailureReason::Cancelled.is_cancelled());
        assert!(!FailureReason::Timeout(10).is_cancelled());
    }
}
