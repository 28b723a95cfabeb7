//! An editing session tying a live conversation to its stores.
//!
//! [`EditorSession`] is the orchestration layer a host editor drives: it
//! loads and reconstructs the conversation on open, routes structural edits
//! through the aggregate, keeps the auxiliary per-node store in step with
//! node lifetimes, and flattens back to the asset store on save. Selection
//! is host state; mutating operations that can invalidate it take it as an
//! argument instead of reaching into the host.

use std::collections::HashSet;

use tracing::{debug, info};

use convo_core::{Conversation, CoreError, NodeId};

use crate::convert::{flatten, reconstruct};
use crate::error::StorageError;
use crate::traits::{AssetStore, NodeDataStore};
use crate::types::{placements, NodePlacement};

/// A live conversation plus the stores persisting it.
pub struct EditorSession<A, D> {
    conversation: Conversation,
    assets: A,
    node_data: D,
}

impl<A, D> EditorSession<A, D>
where
    A: AssetStore,
    D: NodeDataStore,
{
    /// Opens a session by loading and reconstructing the stored asset.
    ///
    /// An empty or absent asset yields a fresh conversation with just a
    /// root node.
    pub fn open(assets: A, node_data: D) -> Result<Self, StorageError> {
        let saved = assets.load()?;
        let conversation = reconstruct(saved);
        info!(nodes = conversation.len(), "conversation opened");
        Ok(EditorSession {
            conversation,
            assets,
            node_data,
        })
    }

    /// The conversation under edit.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Mutable access for payload edits that do not change the structure.
    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    /// The auxiliary per-node store.
    pub fn node_data(&self) -> &D {
        &self.node_data
    }

    pub fn node_data_mut(&mut self) -> &mut D {
        &mut self.node_data
    }

    /// Canvas placement of every node, for the host to lay out.
    pub fn placements(&self) -> Vec<NodePlacement> {
        placements(&self.conversation)
    }

    // -----------------------------------------------------------------------
    // Structural edits
    // -----------------------------------------------------------------------

    /// Creates a speech node under `parent`.
    pub fn create_speech(&mut self, parent: NodeId) -> Result<NodeId, CoreError> {
        self.conversation.create_speech(parent)
    }

    /// Creates an option node under `parent`.
    pub fn create_option(&mut self, parent: NodeId) -> Result<NodeId, CoreError> {
        self.conversation.create_option(parent)
    }

    /// Connects two existing nodes.
    pub fn connect(&mut self, parent: NodeId, child: NodeId) -> Result<(), CoreError> {
        self.conversation.connect(parent, child)
    }

    /// Removes the link between two nodes. Returns how many forward
    /// connections were swept.
    pub fn delete_connection(&mut self, parent: NodeId, child: NodeId) -> Result<usize, CoreError> {
        self.conversation.delete_connection(parent, child)
    }

    /// Deletes a node, its auxiliary payload, and any selection pointing
    /// at it.
    ///
    /// Returns `Ok(false)` when the target is the root, which is never
    /// deletable; the graph, payload, and selection are untouched in that
    /// case. A missing node is an error.
    pub fn delete_node(
        &mut self,
        id: NodeId,
        selection: &mut Option<NodeId>,
    ) -> Result<bool, StorageError> {
        match self.conversation.delete_node(id) {
            Ok(removed) => {
                self.node_data.remove(removed.id);
                if *selection == Some(removed.id) {
                    *selection = None;
                }
                debug!(node = %removed.id, "node deleted");
                Ok(true)
            }
            Err(CoreError::RootDeletion { .. }) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Flattens the conversation and writes it to the asset store, then
    /// prunes auxiliary payloads whose node no longer exists.
    pub fn save(&mut self) -> Result<(), StorageError> {
        let asset = flatten(&self.conversation);
        self.assets.save(&asset)?;

        let live: HashSet<NodeId> = self.conversation.node_ids().collect();
        self.node_data.retain(&live);
        info!(nodes = asset.speech_nodes.len() + asset.option_nodes.len(), "conversation saved");
        Ok(())
    }
}
