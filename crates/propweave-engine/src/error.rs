//! Error types for the weaving pipeline.

use std::path::PathBuf;

use propweave_core::RepositoryError;
use thiserror::Error;

use crate::plan::Conflict;

/// Result type for weaving operations.
pub type WeaveResult<T> = Result<T, WeaveError>;

/// Errors that stop a weaving run.
#[derive(Debug, Error)]
pub enum WeaveError {
    /// A type requested injection but already has the capability.
    #[error(transparent)]
    Conflict(#[from] Conflict),

    /// Several conflicts, in visit order. Never empty.
    #[error("{}", summarize(.0))]
    Conflicts(Vec<Conflict>),

    /// A namespace filter is not a valid regular expression.
    #[error("invalid namespace pattern {pattern:?}: {source}")]
    InvalidNamespacePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The host cancelled the run between two units of work.
    #[error("weaving cancelled during {stage}")]
    Cancelled { stage: &'static str },

    /// An invariant of the type forest was broken.
    #[error("weaver inconsistency: {message}")]
    Inconsistent { message: String },

    /// Descriptor repository error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Config file could not be read or written.
    #[error("failed to access config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WeaveError {
    /// Create an inconsistency error.
    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::Inconsistent {
            message: message.into(),
        }
    }

    /// Conflicts carried by this error, if any.
    pub fn conflicts(&self) -> &[Conflict] {
        match self {
            WeaveError::Conflict(conflict) => std::slice::from_ref(conflict),
            WeaveError::Conflicts(conflicts) => conflicts,
            _ => &[],
        }
    }
}

fn summarize(conflicts: &[Conflict]) -> String {
    match conflicts {
        [] => "no conflicts".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more conflicts)", first, rest.len()),
    }
}
