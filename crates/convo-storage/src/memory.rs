//! In-memory implementations of the storage traits.
//!
//! [`InMemoryAssetStore`] and [`InMemoryNodeDataStore`] are first-class
//! backends for tests and ephemeral sessions, with identical semantics to
//! the file-backed stores.

use std::collections::{HashMap, HashSet};

use convo_core::NodeId;

use crate::error::StorageError;
use crate::traits::{AssetStore, NodeDataStore};
use crate::types::SavedConversation;

/// Asset store that keeps the flattened conversation in memory.
#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    asset: Option<SavedConversation>,
}

impl InMemoryAssetStore {
    /// An empty store with nothing saved yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with an asset, as if it had been saved before.
    pub fn seeded(asset: SavedConversation) -> Self {
        InMemoryAssetStore { asset: Some(asset) }
    }
}

impl AssetStore for InMemoryAssetStore {
    fn load(&self) -> Result<Option<SavedConversation>, StorageError> {
        Ok(self.asset.clone())
    }

    fn save(&mut self, asset: &SavedConversation) -> Result<(), StorageError> {
        self.asset = Some(asset.clone());
        Ok(())
    }
}

/// Node data store backed by a `HashMap`.
#[derive(Debug)]
pub struct InMemoryNodeDataStore<P> {
    payloads: HashMap<NodeId, P>,
}

impl<P> InMemoryNodeDataStore<P> {
    pub fn new() -> Self {
        InMemoryNodeDataStore {
            payloads: HashMap::new(),
        }
    }

    /// Number of stored payloads.
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

impl<P> Default for InMemoryNodeDataStore<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> NodeDataStore for InMemoryNodeDataStore<P> {
    type Payload = P;

    fn get(&self, id: NodeId) -> Option<&P> {
        self.payloads.get(&id)
    }

    fn insert(&mut self, id: NodeId, payload: P) {
        self.payloads.insert(id, payload);
    }

    fn remove(&mut self, id: NodeId) -> Option<P> {
        self.payloads.remove(&id)
    }

    fn retain(&mut self, live: &HashSet<NodeId>) {
        self.payloads.retain(|id, _| live.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::flatten;
    use convo_core::Conversation;

    #[test]
    fn asset_store_round_trips_the_saved_conversation() {
        let asset = flatten(&Conversation::new());
        let mut store = InMemoryAssetStore::new();
        assert!(store.load().unwrap().is_none());

        store.save(&asset).unwrap();
        assert_eq!(store.load().unwrap(), Some(asset));
    }

    #[test]
    fn node_data_retain_prunes_dead_ids() {
        let mut store = InMemoryNodeDataStore::new();
        store.insert(NodeId(1), "one");
        store.insert(NodeId(2), "two");
        store.insert(NodeId(3), "three");

        let live: HashSet<NodeId> = [NodeId(1), NodeId(3)].into_iter().collect();
        store.retain(&live);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(NodeId(1)), Some(&"one"));
        assert!(store.get(NodeId(2)).is_none());
        assert_eq!(store.remove(NodeId(3)), Some("three"));
    }
}
