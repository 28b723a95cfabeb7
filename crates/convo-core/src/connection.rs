//! Typed, directed edges between conversation nodes.
//!
//! A connection carries two things: the target's stable id (authoritative for
//! persistence) and a `resolved` flag standing in for the live reference the
//! reconstruction pass establishes. The flag is rebuilt on every load and is
//! never persisted. Traversal follows resolved connections only; an
//! unresolved connection stays in the list as a dangling placeholder.

use serde::{Deserialize, Serialize};

use crate::id::NodeId;
use crate::node::NodeKind;

/// Persisted tag of a connection: which node variant it leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionKind {
    /// The edge leads to a speech node.
    Speech,
    /// The edge leads to a player option node.
    Option,
}

impl ConnectionKind {
    /// Returns `true` if a node of `kind` is a valid target for this tag.
    pub fn matches(self, kind: NodeKind) -> bool {
        matches!(
            (self, kind),
            (ConnectionKind::Speech, NodeKind::Speech) | (ConnectionKind::Option, NodeKind::Option)
        )
    }
}

/// A directed edge from one conversation node to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    /// Leads to a speech node.
    Speech { target: NodeId, resolved: bool },
    /// Leads to a player option node.
    Option { target: NodeId, resolved: bool },
}

impl Connection {
    /// Builds a connection of the given kind.
    pub fn new(kind: ConnectionKind, target: NodeId, resolved: bool) -> Self {
        match kind {
            ConnectionKind::Speech => Connection::Speech { target, resolved },
            ConnectionKind::Option => Connection::Option { target, resolved },
        }
    }

    /// Builds a connection that already points at a live node.
    pub fn resolved(kind: ConnectionKind, target: NodeId) -> Self {
        Self::new(kind, target, true)
    }

    /// The persisted tag of this connection.
    pub fn kind(&self) -> ConnectionKind {
        match self {
            Connection::Speech { .. } => ConnectionKind::Speech,
            Connection::Option { .. } => ConnectionKind::Option,
        }
    }

    /// The stable id this connection points at, resolved or not.
    pub fn target(&self) -> NodeId {
        match self {
            Connection::Speech { target, .. } | Connection::Option { target, .. } => *target,
        }
    }

    /// Whether the last reconstruction found a live node for the target.
    pub fn is_resolved(&self) -> bool {
        match self {
            Connection::Speech { resolved, .. } | Connection::Option { resolved, .. } => *resolved,
        }
    }

    /// The target id, but only when the connection points at a live node.
    pub fn live_target(&self) -> Option<NodeId> {
        if self.is_resolved() {
            Some(self.target())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_target_round_through_new() {
        let c = Connection::new(ConnectionKind::Option, NodeId(9), true);
        assert_eq!(c.kind(), ConnectionKind::Option);
        assert_eq!(c.target(), NodeId(9));
        assert!(c.is_resolved());
    }

    #[test]
    fn unresolved_connection_has_no_live_target() {
        let c = Connection::new(ConnectionKind::Speech, NodeId(3), false);
        assert_eq!(c.live_target(), None);
        assert_eq!(c.target(), NodeId(3));
    }

    #[test]
    fn kind_matches_node_variant() {
        assert!(ConnectionKind::Speech.matches(NodeKind::Speech));
        assert!(ConnectionKind::Option.matches(NodeKind::Option));
        assert!(!ConnectionKind::Speech.matches(NodeKind::Option));
        assert!(!ConnectionKind::Option.matches(NodeKind::Speech));
    }
}
