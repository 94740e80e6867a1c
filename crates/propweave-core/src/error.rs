//! Error types for the descriptor repository.

use std::path::PathBuf;

use thiserror::Error;

use crate::descriptor::TypeName;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors raised while assembling a [`crate::TypeRepository`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Two descriptors share a qualified name.
    #[error("duplicate type declaration: {name}")]
    DuplicateType { name: TypeName },

    /// Base-type references loop back on themselves.
    #[error("inheritance cycle detected at type {name}")]
    InheritanceCycle { name: TypeName },

    /// A manifest could not be read.
    #[error("failed to read manifest {path}: {source}")]
    ManifestIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("manifest json error: {0}")]
    Json(#[from] serde_json::Error),
}
