//! The persisted conversation format.
//!
//! These records are the wire shape of a conversation asset. Scalar node
//! payloads are shared with convo-core and flattened into the records; the
//! link fields (`parent_ids`, `connections`) are the persisted, id-based
//! form of the live graph's references.
//!
//! Two format generations exist. V1.03 assets predate explicit connection
//! lists and instead carry per-node `option_ids` / `next_speech_id` fields;
//! the reconstruction engine migrates them in place on load. Everything
//! saved by this crate is stamped [`SaveVersion::CURRENT`].

use serde::{Deserialize, Serialize};

use convo_core::{
    ConnectionKind, Conversation, ConversationDefaults, EditorPosition, NodeId, NodeKind,
    OptionData, Parameter, SpeechData,
};

/// Format generation of a persisted conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveVersion {
    /// Legacy layout without explicit connection lists.
    #[serde(rename = "1.03")]
    V1_03,
    /// Current layout with typed `(kind, target)` connection records.
    #[serde(rename = "1.10")]
    V1_10,
}

impl SaveVersion {
    /// The format this crate writes.
    pub const CURRENT: SaveVersion = SaveVersion::V1_10;

    /// Whether a load from this version goes through the migration path.
    pub fn is_legacy(self) -> bool {
        self == SaveVersion::V1_03
    }
}

/// Persisted form of one outgoing edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedConnection {
    pub kind: ConnectionKind,
    pub target: NodeId,
}

/// Persisted form of a speech node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSpeechNode {
    pub id: NodeId,
    #[serde(default)]
    pub is_root: bool,
    #[serde(default)]
    pub position: EditorPosition,
    /// Parent ids as last flattened; deduplicated and re-resolved on load.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_ids: Vec<NodeId>,
    /// Typed outgoing edges (V1.10+).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<SavedConnection>,
    #[serde(flatten)]
    pub data: SpeechData,
    /// V1.03 only: ids of this speech's options. Superseded by `connections`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub option_ids: Vec<NodeId>,
    /// V1.03 only: id of the speech that follows this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_speech_id: Option<NodeId>,
}

impl SavedSpeechNode {
    /// A fresh, unlinked speech record.
    pub fn new(id: NodeId, data: SpeechData) -> Self {
        SavedSpeechNode {
            id,
            is_root: false,
            position: EditorPosition::default(),
            parent_ids: Vec::new(),
            connections: Vec::new(),
            data,
            option_ids: Vec::new(),
            next_speech_id: None,
        }
    }
}

/// Persisted form of an option node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedOptionNode {
    pub id: NodeId,
    #[serde(default)]
    pub is_root: bool,
    #[serde(default)]
    pub position: EditorPosition,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_ids: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<SavedConnection>,
    #[serde(flatten)]
    pub data: OptionData,
    /// V1.03 only: id of the speech this option leads to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_speech_id: Option<NodeId>,
}

impl SavedOptionNode {
    /// A fresh, unlinked option record.
    pub fn new(id: NodeId, data: OptionData) -> Self {
        SavedOptionNode {
            id,
            is_root: false,
            position: EditorPosition::default(),
            parent_ids: Vec::new(),
            connections: Vec::new(),
            data,
            next_speech_id: None,
        }
    }
}

/// A complete persisted conversation asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedConversation {
    pub save_version: SaveVersion,
    /// Persisted id counter; the allocator resumes from here on load.
    #[serde(default)]
    pub next_id: u32,
    #[serde(default)]
    pub defaults: ConversationDefaults,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub speech_nodes: Vec<SavedSpeechNode>,
    #[serde(default)]
    pub option_nodes: Vec<SavedOptionNode>,
}

/// Thin presentation wrapper handed to the canvas layer: one per node,
/// carrying the persisted screen position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePlacement {
    pub id: NodeId,
    pub kind: NodeKind,
    pub is_root: bool,
    pub position: EditorPosition,
}

/// Maps every live node to its presentation wrapper, in node order.
pub fn placements(conversation: &Conversation) -> Vec<NodePlacement> {
    conversation
        .iter()
        .map(|node| NodePlacement {
            id: node.id,
            kind: node.kind(),
            is_root: node.is_root(),
            position: node.position,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_version_serializes_as_dotted_string() {
        assert_eq!(serde_json::to_string(&SaveVersion::V1_03).unwrap(), "\"1.03\"");
        assert_eq!(serde_json::to_string(&SaveVersion::V1_10).unwrap(), "\"1.10\"");
        let back: SaveVersion = serde_json::from_str("\"1.03\"").unwrap();
        assert!(back.is_legacy());
    }

    #[test]
    fn legacy_fields_are_omitted_from_current_saves() {
        let record = SavedSpeechNode::new(
            NodeId(1),
            SpeechData::with_defaults(&ConversationDefaults::default()),
        );
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("option_ids"));
        assert!(!json.contains("next_speech_id"));
    }

    #[test]
    fn legacy_fields_deserialize_when_present() {
        let json = r#"{
            "id": 0,
            "is_root": true,
            "name": "Guard",
            "text": "Halt!",
            "volume": 1.0,
            "advance": {"enabled": false, "show_continue_option": true, "delay_seconds": 1.0},
            "option_ids": [10, 11],
            "next_speech_id": 20
        }"#;
        let record: SavedSpeechNode = serde_json::from_str(json).unwrap();
        assert_eq!(record.option_ids, vec![NodeId(10), NodeId(11)]);
        assert_eq!(record.next_speech_id, Some(NodeId(20)));
        assert!(record.connections.is_empty());
    }

    #[test]
    fn placements_mirror_the_node_set() {
        let mut convo = Conversation::new();
        let root = convo.root();
        let option = convo.create_option(root).unwrap();
        convo.get_mut(option).unwrap().position = EditorPosition::new(40.0, 80.0);

        let wrappers = placements(&convo);
        assert_eq!(wrappers.len(), 2);
        assert!(wrappers[0].is_root);
        assert_eq!(wrappers[1].id, option);
        assert_eq!(wrappers[1].kind, NodeKind::Option);
        assert_eq!(wrappers[1].position, EditorPosition::new(40.0, 80.0));
    }
}
