//! Core error types for convo-core.
//!
//! Uses `thiserror` for structured, matchable variants. None of these are
//! fatal to an editing session: callers treat them as rejected operations
//! and leave the graph untouched.

use thiserror::Error;

use crate::id::NodeId;

/// Errors produced by conversation graph operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A node id was not found in the conversation.
    #[error("node not found: NodeId({id})", id = id.0)]
    NodeNotFound { id: NodeId },

    /// The conversation root was targeted for deletion.
    #[error("the conversation root cannot be deleted: NodeId({id})", id = id.0)]
    RootDeletion { id: NodeId },

    /// A connection failed structural validation.
    #[error("invalid connection: {reason}")]
    InvalidConnection { reason: String },
}
