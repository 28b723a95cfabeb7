//! The conversation aggregate and every structural mutation on it.
//!
//! [`Conversation`] owns the full node set, the designated root, the id
//! allocator, and conversation-level defaults. All edits go through its
//! methods so the graph invariants hold after every operation:
//!
//! - exactly one root, always a speech node, never deletable;
//! - ids unique across the node set;
//! - every back-reference mirrored by a forward connection (for graphs
//!   produced by these operations);
//! - no duplicate back-reference entries.
//!
//! The aggregate is single-actor state: mutations run synchronously in
//! response to discrete editor actions, with no sharing across sessions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::connection::{Connection, ConnectionKind};
use crate::error::CoreError;
use crate::id::{IdAllocator, NodeId};
use crate::node::{DialogueNode, NodeKind, OptionData, SpeechData};
use crate::params::Parameter;

/// Conversation-level defaults applied to newly created nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConversationDefaults {
    /// Default speaker name for new speech nodes.
    #[serde(default)]
    pub name: String,
    /// Default portrait asset reference for new speech nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Default font asset reference for new speech and option nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
}

/// A branching dialogue graph under edit.
#[derive(Debug, Clone)]
pub struct Conversation {
    /// Union of speech and option nodes, in insertion order.
    nodes: IndexMap<NodeId, DialogueNode>,
    /// The designated entry speech node.
    root: NodeId,
    /// Monotonic id source, persisted across sessions.
    ids: IdAllocator,
    /// Defaults for newly created nodes.
    pub defaults: ConversationDefaults,
    /// Named parameters referenced by option conditions.
    pub parameters: Vec<Parameter>,
}

impl Conversation {
    /// An empty conversation with a freshly created root speech node.
    pub fn new() -> Self {
        let defaults = ConversationDefaults::default();
        let mut ids = IdAllocator::new();
        let root_id = ids.allocate();
        let root = DialogueNode::root(root_id, SpeechData::with_defaults(&defaults));

        let mut nodes = IndexMap::new();
        nodes.insert(root_id, root);

        Conversation {
            nodes,
            root: root_id,
            ids,
            defaults,
            parameters: Vec::new(),
        }
    }

    /// Assembles a conversation from parts prepared by the storage layer.
    ///
    /// The reconstruction engine guarantees the invariants before calling
    /// this; debug builds re-check them.
    pub fn from_parts(
        nodes: IndexMap<NodeId, DialogueNode>,
        root: NodeId,
        ids: IdAllocator,
        defaults: ConversationDefaults,
        parameters: Vec<Parameter>,
    ) -> Self {
        let conversation = Conversation {
            nodes,
            root,
            ids,
            defaults,
            parameters,
        };
        #[cfg(debug_assertions)]
        conversation.assert_consistency();
        conversation
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    /// Id of the root speech node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The root speech node itself.
    pub fn root_node(&self) -> &DialogueNode {
        &self.nodes[&self.root]
    }

    /// Looks up a node by id.
    pub fn get(&self, id: NodeId) -> Option<&DialogueNode> {
        self.nodes.get(&id)
    }

    /// Looks up a node by id, mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut DialogueNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &DialogueNode> {
        self.nodes.values()
    }

    /// All live node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// The persisted id counter value.
    pub fn id_counter(&self) -> u32 {
        self.ids.peek()
    }

    // -----------------------------------------------------------------------
    // Node creation
    // -----------------------------------------------------------------------

    /// Creates a speech node as a child of `parent`.
    ///
    /// The new node carries the conversation defaults (name, icon, font) and
    /// the next id from the allocator. Any node variant may parent a speech.
    pub fn create_speech(&mut self, parent: NodeId) -> Result<NodeId, CoreError> {
        if !self.nodes.contains_key(&parent) {
            return Err(CoreError::NodeNotFound { id: parent });
        }
        let id = self.ids.allocate();
        let node = DialogueNode::speech(id, SpeechData::with_defaults(&self.defaults));
        self.nodes.insert(id, node);
        self.attach(parent, id, ConnectionKind::Speech);
        Ok(id)
    }

    /// Creates an option node as a child of `parent`.
    ///
    /// Only speech nodes may parent options.
    pub fn create_option(&mut self, parent: NodeId) -> Result<NodeId, CoreError> {
        match self.nodes.get(&parent) {
            None => return Err(CoreError::NodeNotFound { id: parent }),
            Some(node) if node.is_option() => {
                return Err(CoreError::InvalidConnection {
                    reason: format!("option node {} cannot parent another option", parent),
                })
            }
            Some(_) => {}
        }
        let id = self.ids.allocate();
        let node = DialogueNode::option(id, OptionData::with_defaults(&self.defaults));
        self.nodes.insert(id, node);
        self.attach(parent, id, ConnectionKind::Option);
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------------

    /// Connects two existing nodes with a typed edge.
    ///
    /// Valid pairs: speech→speech, speech→option, option→speech. The edge is
    /// appended to the parent's connection list and the parent is recorded in
    /// the child's back-references (once). Duplicate forward connections are
    /// not prevented; deletion handles them defensively.
    pub fn connect(&mut self, parent: NodeId, child: NodeId) -> Result<(), CoreError> {
        if parent == child {
            return Err(CoreError::InvalidConnection {
                reason: format!("node {} cannot connect to itself", parent),
            });
        }
        let parent_kind = self
            .nodes
            .get(&parent)
            .map(DialogueNode::kind)
            .ok_or(CoreError::NodeNotFound { id: parent })?;
        let child_kind = self
            .nodes
            .get(&child)
            .map(DialogueNode::kind)
            .ok_or(CoreError::NodeNotFound { id: child })?;

        if parent_kind == NodeKind::Option && child_kind == NodeKind::Option {
            return Err(CoreError::InvalidConnection {
                reason: format!("option {} cannot lead to option {}", parent, child),
            });
        }

        let kind = match child_kind {
            NodeKind::Speech => ConnectionKind::Speech,
            NodeKind::Option => ConnectionKind::Option,
        };
        self.attach(parent, child, kind);
        Ok(())
    }

    /// Removes the link between `parent` and `child`.
    ///
    /// Drops the single back-reference on the child and *every* forward
    /// connection on the parent whose resolved target is the child (at most
    /// one in a well-formed graph, but duplicates are swept too).
    pub fn delete_connection(&mut self, parent: NodeId, child: NodeId) -> Result<usize, CoreError> {
        if !self.nodes.contains_key(&parent) {
            return Err(CoreError::NodeNotFound { id: parent });
        }
        let Some(child_node) = self.nodes.get_mut(&child) else {
            return Err(CoreError::NodeNotFound { id: child });
        };

        child_node.remove_parent(parent);
        let removed = self
            .nodes
            .get_mut(&parent)
            .map(|p| p.remove_connections_to(child))
            .unwrap_or(0);
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Node deletion
    // -----------------------------------------------------------------------

    /// Deletes a node and detaches it from the graph.
    ///
    /// Rejected for the root. Otherwise removes every connection targeting
    /// the node from its parents, scrubs the node from every survivor's
    /// back-references, clears its own parent list, and removes it from the
    /// node set. Returns the removed node; auxiliary per-id data and any
    /// externally held selection are the caller's responsibility.
    pub fn delete_node(&mut self, id: NodeId) -> Result<DialogueNode, CoreError> {
        let Some(node) = self.nodes.get(&id) else {
            return Err(CoreError::NodeNotFound { id });
        };
        if node.is_root {
            warn!(node = %id, "refusing to delete the conversation root");
            return Err(CoreError::RootDeletion { id });
        }

        let parents: Vec<NodeId> = node.parents.to_vec();

        for parent in parents {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.remove_connections_to(id);
            }
        }
        // A back-reference can exist without a resolved forward edge (stored
        // records with a kind-mismatched connection), so every survivor gets
        // scrubbed, not just the resolved children.
        for other in self.nodes.values_mut() {
            other.scrub_parent(id);
        }

        // shift_remove keeps the insertion order of the survivors stable.
        let mut removed = self
            .nodes
            .shift_remove(&id)
            .ok_or(CoreError::NodeNotFound { id })?;
        removed.parents.clear();
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Links two validated nodes: forward connection plus back-reference.
    fn attach(&mut self, parent: NodeId, child: NodeId, kind: ConnectionKind) {
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.connections.push(Connection::resolved(kind, child));
        }
        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.push_parent(parent);
        }
    }

    /// Re-checks the aggregate invariants. Debug builds only.
    #[cfg(debug_assertions)]
    fn assert_consistency(&self) {
        let root = self
            .nodes
            .get(&self.root)
            .expect("root id must resolve to a live node");
        assert!(root.is_speech(), "root must be a speech node");
        assert!(root.is_root, "root node must carry the is_root flag");
        for node in self.nodes.values() {
            assert!(
                node.id == self.root || !node.is_root,
                "only the designated root may carry the is_root flag"
            );
            assert!(
                node.id.0 < self.ids.peek(),
                "allocator must stay ahead of every live id"
            );
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
