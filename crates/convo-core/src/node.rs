//! Conversation node model: speech and option variants behind one wrapper.
//!
//! [`DialogueNode`] carries the capability shared by both variants (identity,
//! canvas position, parent back-references, outgoing connections); the
//! variant payload lives in the closed [`NodeContent`] sum and is dispatched
//! by pattern matching, never by runtime type inspection.

use serde::{Deserialize, Deserializer, Serialize};
use smallvec::SmallVec;

use crate::connection::Connection;
use crate::conversation::ConversationDefaults;
use crate::id::NodeId;
use crate::params::Condition;

/// Smallest auto-advance delay the editor accepts, in seconds.
pub const MIN_ADVANCE_DELAY: f32 = 0.1;

/// On-canvas position of a node. Cosmetic only; never affects graph
/// semantics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EditorPosition {
    pub x: f32,
    pub y: f32,
}

impl EditorPosition {
    pub fn new(x: f32, y: f32) -> Self {
        EditorPosition { x, y }
    }
}

/// Which variant a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// An NPC utterance.
    Speech,
    /// A player-selectable response.
    Option,
}

/// Auto-advance behaviour of a speech node whose next step is more speech.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoAdvance {
    /// Advance to the following speech without player input.
    pub enabled: bool,
    /// Still display a "continue" option while the timer runs.
    pub show_continue_option: bool,
    #[serde(deserialize_with = "clamped_delay")]
    delay_seconds: f32,
}

impl AutoAdvance {
    /// Builds an auto-advance setting, clamping the delay to
    /// [`MIN_ADVANCE_DELAY`].
    pub fn new(enabled: bool, show_continue_option: bool, delay_seconds: f32) -> Self {
        AutoAdvance {
            enabled,
            show_continue_option,
            delay_seconds: delay_seconds.max(MIN_ADVANCE_DELAY),
        }
    }

    /// Seconds to wait before advancing.
    pub fn delay_seconds(&self) -> f32 {
        self.delay_seconds
    }

    /// Sets the delay, clamping to [`MIN_ADVANCE_DELAY`].
    pub fn set_delay_seconds(&mut self, seconds: f32) {
        self.delay_seconds = seconds.max(MIN_ADVANCE_DELAY);
    }
}

impl Default for AutoAdvance {
    fn default() -> Self {
        AutoAdvance {
            enabled: false,
            show_continue_option: true,
            delay_seconds: 1.0,
        }
    }
}

fn clamped_delay<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f32::deserialize(deserializer)?;
    Ok(raw.max(MIN_ADVANCE_DELAY))
}

/// Display and audio metadata of an NPC utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechData {
    /// Speaking character's display name.
    pub name: String,
    /// The spoken line.
    pub text: String,
    /// Portrait asset reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Voice clip asset reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    /// Playback volume, 0.0 to 1.0.
    pub volume: f32,
    /// Font asset reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    /// Auto-advance settings.
    pub advance: AutoAdvance,
}

impl SpeechData {
    /// A speech payload seeded from the conversation defaults.
    pub fn with_defaults(defaults: &ConversationDefaults) -> Self {
        SpeechData {
            name: defaults.name.clone(),
            text: String::new(),
            icon: defaults.icon.clone(),
            audio: None,
            volume: 1.0,
            font: defaults.font.clone(),
            advance: AutoAdvance::default(),
        }
    }
}

/// A player-selectable response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionData {
    /// The choice text shown to the player.
    pub text: String,
    /// Font asset reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    /// Gating conditions keyed by conversation parameters. Stored and
    /// round-tripped, not evaluated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl OptionData {
    /// An option payload seeded from the conversation defaults.
    pub fn with_defaults(defaults: &ConversationDefaults) -> Self {
        OptionData {
            text: String::new(),
            font: defaults.font.clone(),
            conditions: Vec::new(),
        }
    }
}

/// The closed variant payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Speech(SpeechData),
    Option(OptionData),
}

impl NodeContent {
    /// The variant tag of this payload.
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeContent::Speech(_) => NodeKind::Speech,
            NodeContent::Option(_) => NodeKind::Option,
        }
    }
}

/// One node of the live conversation graph.
///
/// `parents` and the `resolved` flags inside `connections` are session
/// state: they are rebuilt on every reconstruction and never trusted from
/// storage.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueNode {
    /// Unique within the conversation; immutable after creation.
    pub id: NodeId,
    /// Exactly one node per conversation carries this flag, and it is
    /// always a speech node. Crate-visible only; external writes would
    /// bypass the aggregate's invariants.
    pub(crate) is_root: bool,
    /// Canvas position, owned by the node.
    pub position: EditorPosition,
    /// Live back-references to the nodes that connect into this one.
    pub(crate) parents: SmallVec<[NodeId; 4]>,
    /// Ordered outgoing edges.
    pub(crate) connections: SmallVec<[Connection; 4]>,
    /// Variant payload.
    pub content: NodeContent,
}

impl DialogueNode {
    /// A fresh speech node with no links.
    pub fn speech(id: NodeId, data: SpeechData) -> Self {
        DialogueNode {
            id,
            is_root: false,
            position: EditorPosition::default(),
            parents: SmallVec::new(),
            connections: SmallVec::new(),
            content: NodeContent::Speech(data),
        }
    }

    /// A fresh option node with no links.
    pub fn option(id: NodeId, data: OptionData) -> Self {
        DialogueNode {
            id,
            is_root: false,
            position: EditorPosition::default(),
            parents: SmallVec::new(),
            connections: SmallVec::new(),
            content: NodeContent::Option(data),
        }
    }

    /// A fresh root speech node.
    pub fn root(id: NodeId, data: SpeechData) -> Self {
        let mut node = Self::speech(id, data);
        node.is_root = true;
        node
    }

    /// Assembles a node from parts prepared by the storage layer.
    ///
    /// Link consistency is the caller's concern; `Conversation::from_parts`
    /// re-checks the aggregate invariants in debug builds.
    pub fn from_parts(
        id: NodeId,
        is_root: bool,
        position: EditorPosition,
        parents: SmallVec<[NodeId; 4]>,
        connections: SmallVec<[Connection; 4]>,
        content: NodeContent,
    ) -> Self {
        DialogueNode {
            id,
            is_root,
            position,
            parents,
            connections,
            content,
        }
    }

    /// The variant tag of this node.
    pub fn kind(&self) -> NodeKind {
        self.content.kind()
    }

    /// Whether this node is the conversation's designated root.
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Back-references to the nodes that connect into this one.
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    /// Ordered outgoing edges, resolved or not.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn is_speech(&self) -> bool {
        self.kind() == NodeKind::Speech
    }

    pub fn is_option(&self) -> bool {
        self.kind() == NodeKind::Option
    }

    /// Speech payload, if this is a speech node.
    pub fn as_speech(&self) -> Option<&SpeechData> {
        match &self.content {
            NodeContent::Speech(data) => Some(data),
            NodeContent::Option(_) => None,
        }
    }

    /// Mutable speech payload, if this is a speech node.
    pub fn as_speech_mut(&mut self) -> Option<&mut SpeechData> {
        match &mut self.content {
            NodeContent::Speech(data) => Some(data),
            NodeContent::Option(_) => None,
        }
    }

    /// Option payload, if this is an option node.
    pub fn as_option(&self) -> Option<&OptionData> {
        match &self.content {
            NodeContent::Option(data) => Some(data),
            NodeContent::Speech(_) => None,
        }
    }

    /// Mutable option payload, if this is an option node.
    pub fn as_option_mut(&mut self) -> Option<&mut OptionData> {
        match &mut self.content {
            NodeContent::Option(data) => Some(data),
            NodeContent::Speech(_) => None,
        }
    }

    /// Ids of children reachable through currently resolved connections, in
    /// connection order. Dangling placeholders are skipped.
    pub fn resolved_children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.connections.iter().filter_map(Connection::live_target)
    }

    /// Records `parent` as a back-reference unless it is already present.
    pub(crate) fn push_parent(&mut self, parent: NodeId) {
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
    }

    /// Removes the single back-reference to `parent`, if present.
    pub(crate) fn remove_parent(&mut self, parent: NodeId) {
        if let Some(pos) = self.parents.iter().position(|&p| p == parent) {
            self.parents.remove(pos);
        }
    }

    /// Scrubs every back-reference to `parent`.
    pub(crate) fn scrub_parent(&mut self, parent: NodeId) {
        self.parents.retain(|&mut p| p != parent);
    }

    /// Removes every connection whose resolved target is `target`.
    ///
    /// There should be at most one, but malformed graphs can carry
    /// duplicates; all of them go. Returns how many were removed.
    pub(crate) fn remove_connections_to(&mut self, target: NodeId) -> usize {
        let before = self.connections.len();
        self.connections
            .retain(|c| !(c.is_resolved() && c.target() == target));
        before - self.connections.len()
    }
}
