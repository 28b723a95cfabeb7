//! Storage error types for convo-storage.
//!
//! [`StorageError`] covers the failure modes of the persistence layer:
//! serialization, asset I/O, and rejected graph operations surfaced through
//! the session. Dangling references are *not* errors anywhere in this crate;
//! reconstruction degrades them to skips or unresolved placeholders.

use thiserror::Error;

use convo_core::CoreError;

/// Errors produced by storage and session operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading or writing the persisted asset failed.
    #[error("asset i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A graph operation was rejected by the core.
    #[error(transparent)]
    Core(#[from] CoreError),
}
