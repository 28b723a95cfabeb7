//! Storage contracts for conversation assets and auxiliary per-node data.
//!
//! Two seams:
//! - [`AssetStore`] persists the flattened conversation as one atomic asset.
//!   Backends are swappable (in-memory for tests, JSON file on disk) without
//!   touching the editing logic.
//! - [`NodeDataStore`] holds side-channel payloads keyed by node id, such as
//!   UI widget state a host editor keeps per node. It follows node lifetimes:
//!   deletion and save both prune entries whose node is gone.
//!
//! Both traits are synchronous; edits run single-actor in response to
//! discrete editor actions.

use std::collections::HashSet;

use convo_core::NodeId;

use crate::error::StorageError;
use crate::types::SavedConversation;

/// Persistence contract for the flattened conversation asset.
pub trait AssetStore {
    /// Loads the stored conversation, or `None` when nothing has been saved
    /// yet.
    fn load(&self) -> Result<Option<SavedConversation>, StorageError>;

    /// Stores the conversation, replacing whatever was there before.
    fn save(&mut self, asset: &SavedConversation) -> Result<(), StorageError>;
}

/// Side-channel storage of per-node payloads keyed by node id.
pub trait NodeDataStore {
    /// Payload type held per node.
    type Payload;

    /// Looks up the payload stored for a node.
    fn get(&self, id: NodeId) -> Option<&Self::Payload>;

    /// Stores or replaces the payload for a node.
    fn insert(&mut self, id: NodeId, payload: Self::Payload);

    /// Removes and returns the payload for a node.
    fn remove(&mut self, id: NodeId) -> Option<Self::Payload>;

    /// Drops every payload whose node id is not in `live`.
    fn retain(&mut self, live: &HashSet<NodeId>);
}
