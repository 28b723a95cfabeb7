//! convo-core: the in-memory model of a branching dialogue conversation.
//!
//! A conversation is a directed graph of speech nodes (NPC utterances) and
//! option nodes (player responses), connected by typed edges and entered
//! through a single root speech node. This crate owns the live, editable
//! form of that graph and every structural mutation on it; persistence and
//! format migration live in `convo-storage`.
//!
//! # Modules
//!
//! - [`id`]: stable node ids and the monotonic allocator
//! - [`node`]: speech/option node model and shared node capability
//! - [`connection`]: typed edges with id-based targets
//! - [`conversation`]: the aggregate and its mutation operations
//! - [`params`]: conversation parameters and inert option conditions
//! - [`error`]: the [`CoreError`] taxonomy

pub mod connection;
pub mod conversation;
pub mod error;
pub mod id;
pub mod node;
pub mod params;

// Re-export commonly used types
pub use connection::{Connection, ConnectionKind};
pub use conversation::{Conversation, ConversationDefaults};
pub use error::CoreError;
pub use id::{IdAllocator, NodeId};
pub use node::{
    AutoAdvance, DialogueNode, EditorPosition, NodeContent, NodeKind, OptionData, SpeechData,
    MIN_ADVANCE_DELAY,
};
pub use params::{Condition, IntCheck, Parameter};
