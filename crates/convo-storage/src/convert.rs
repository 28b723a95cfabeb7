//! Reconstruction and flattening between the persisted records and the live
//! graph.
//!
//! [`reconstruct`] turns a persisted [`SavedConversation`] (or nothing at
//! all) into a fully linked [`Conversation`]: parent ids are deduplicated
//! and resolved, connections are resolved or migrated from the V1.03 layout,
//! and back-references are rebuilt from the forward edges. [`flatten`] is
//! the inverse: it regenerates the id-based link fields from the live graph
//! and partitions the nodes back into speech/option record lists, stamped
//! with the current save version.
//!
//! Reference-handling rules, kept deliberately asymmetric for compatibility
//! with existing assets:
//! - stored parent ids that resolve to nothing are silently skipped;
//! - V1.03 legacy links to missing nodes produce no connection at all;
//! - V1.10 connections to missing nodes are kept as unresolved placeholders.

use std::collections::HashMap;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use convo_core::{
    Connection, ConnectionKind, Conversation, DialogueNode, EditorPosition, IdAllocator,
    NodeContent, NodeId, NodeKind, SpeechData,
};

use crate::types::{SavedConnection, SavedConversation, SavedOptionNode, SavedSpeechNode, SaveVersion};

/// One node's worth of resolved state, gathered before the live nodes are
/// assembled.
struct PreparedNode {
    position: EditorPosition,
    parents: SmallVec<[NodeId; 4]>,
    connections: SmallVec<[Connection; 4]>,
    content: NodeContent,
}

/// Rebuilds a live conversation from a persisted asset.
///
/// `None` means "no conversation yet" (absent or unreadable asset) and
/// synthesizes an empty conversation with a fresh root speech node.
pub fn reconstruct(saved: Option<SavedConversation>) -> Conversation {
    let Some(saved) = saved else {
        debug!("no stored conversation; starting a fresh one");
        return Conversation::new();
    };
    reconstruct_saved(saved)
}

fn reconstruct_saved(mut saved: SavedConversation) -> Conversation {
    if saved.save_version.is_legacy() {
        debug!("migrating V1.03 conversation to explicit connection lists");
    }

    // A root must exist before any resolution happens.
    let root = ensure_root(&mut saved);

    // Node kinds by id. Speech records take precedence, matching the
    // duplicate-id rule below.
    let mut kinds: HashMap<NodeId, NodeKind> = HashMap::new();
    for record in &saved.speech_nodes {
        kinds.entry(record.id).or_insert(NodeKind::Speech);
    }
    for record in &saved.option_nodes {
        kinds.entry(record.id).or_insert(NodeKind::Option);
    }

    // Per record: dedupe parent ids, then resolve or migrate connections.
    // Duplicate ids keep the first record, speech records first.
    let mut prepared: IndexMap<NodeId, PreparedNode> =
        IndexMap::with_capacity(saved.speech_nodes.len() + saved.option_nodes.len());
    for record in &saved.speech_nodes {
        if prepared.contains_key(&record.id) {
            warn!(node = %record.id, "duplicate node id in stored asset; keeping the first record");
            continue;
        }
        let connections = match saved.save_version {
            SaveVersion::V1_03 => migrate_legacy_speech(record, &kinds),
            SaveVersion::V1_10 => resolve_connections(&record.connections, &kinds),
        };
        prepared.insert(
            record.id,
            PreparedNode {
                position: record.position,
                parents: resolve_parent_ids(&record.parent_ids, &kinds),
                connections,
                content: NodeContent::Speech(record.data.clone()),
            },
        );
    }
    for record in &saved.option_nodes {
        if prepared.contains_key(&record.id) {
            warn!(node = %record.id, "duplicate node id in stored asset; keeping the first record");
            continue;
        }
        let connections = match saved.save_version {
            SaveVersion::V1_03 => migrate_legacy_option(record, &kinds),
            SaveVersion::V1_10 => resolve_connections(&record.connections, &kinds),
        };
        prepared.insert(
            record.id,
            PreparedNode {
                position: record.position,
                parents: resolve_parent_ids(&record.parent_ids, &kinds),
                connections,
                content: NodeContent::Option(record.data.clone()),
            },
        );
    }

    // Forward edges rebuild the backward links; stored back-references are
    // never the authority. Already-present entries are not duplicated, so
    // repeated load/save cycles stay stable.
    let edges: Vec<(NodeId, NodeId)> = prepared
        .iter()
        .flat_map(|(&id, node)| {
            node.connections
                .iter()
                .filter_map(move |c| c.live_target().map(|child| (child, id)))
        })
        .collect();
    for (child, parent) in edges {
        if let Some(child_node) = prepared.get_mut(&child) {
            if !child_node.parents.contains(&parent) {
                child_node.parents.push(parent);
            }
        }
    }

    // The allocator resumes past both the stored counter and every id that
    // actually made it into the records.
    let mut ids = IdAllocator::resume(saved.next_id);
    for id in prepared.keys() {
        ids.reserve_through(*id);
    }

    // The chosen root id is authoritative for the flag: a duplicate record
    // can carry `is_root` while the kept one does not.
    let nodes: IndexMap<NodeId, DialogueNode> = prepared
        .into_iter()
        .map(|(id, node)| {
            (
                id,
                DialogueNode::from_parts(
                    id,
                    id == root,
                    node.position,
                    node.parents,
                    node.connections,
                    node.content,
                ),
            )
        })
        .collect();

    Conversation::from_parts(nodes, root, ids, saved.defaults, saved.parameters)
}

/// Guarantees exactly one root speech record, synthesizing one if absent.
/// Returns the root's id.
fn ensure_root(saved: &mut SavedConversation) -> NodeId {
    let mut root = None;
    for record in &saved.speech_nodes {
        if record.is_root {
            if root.is_some() {
                warn!(node = %record.id, "demoting extra root claim");
            } else {
                root = Some(record.id);
            }
        }
    }
    for record in &saved.option_nodes {
        if record.is_root {
            warn!(node = %record.id, "an option node cannot be the root");
        }
    }

    if let Some(id) = root {
        return id;
    }

    let id = NodeId(next_free_id(saved));
    debug!(node = %id, "no root present; synthesizing one");
    let mut record = SavedSpeechNode::new(id, SpeechData::with_defaults(&saved.defaults));
    record.is_root = true;
    saved.speech_nodes.push(record);
    if saved.next_id <= id.0 {
        saved.next_id = id.0 + 1;
    }
    id
}

fn next_free_id(saved: &SavedConversation) -> u32 {
    let highest = saved
        .speech_nodes
        .iter()
        .map(|n| n.id.0)
        .chain(saved.option_nodes.iter().map(|n| n.id.0))
        .max();
    match highest {
        Some(max) => saved.next_id.max(max + 1),
        None => saved.next_id,
    }
}

/// Deduplicates stored parent ids (first-seen order) and drops the ones
/// that no longer resolve to a live node.
fn resolve_parent_ids(
    stored: &[NodeId],
    kinds: &HashMap<NodeId, NodeKind>,
) -> SmallVec<[NodeId; 4]> {
    let mut out = SmallVec::new();
    for &id in stored {
        if kinds.contains_key(&id) && !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

/// Resolves current-format connections in place.
///
/// An unresolvable pair stays in the list as a dangling placeholder; it is
/// skipped by traversal but not removed from storage here.
fn resolve_connections(
    stored: &[SavedConnection],
    kinds: &HashMap<NodeId, NodeKind>,
) -> SmallVec<[Connection; 4]> {
    stored
        .iter()
        .map(|c| {
            let resolved = kinds.get(&c.target).is_some_and(|&k| c.kind.matches(k));
            Connection::new(c.kind, c.target, resolved)
        })
        .collect()
}

/// Synthesizes connections for a V1.03 speech node from its deprecated
/// `option_ids` / `next_speech_id` fields. Missing targets produce no
/// connection at all.
fn migrate_legacy_speech(
    record: &SavedSpeechNode,
    kinds: &HashMap<NodeId, NodeKind>,
) -> SmallVec<[Connection; 4]> {
    let mut out = SmallVec::new();
    for &option_id in &record.option_ids {
        if kinds.get(&option_id) == Some(&NodeKind::Option) {
            out.push(Connection::resolved(ConnectionKind::Option, option_id));
        }
    }
    if let Some(speech_id) = record.next_speech_id {
        if kinds.get(&speech_id) == Some(&NodeKind::Speech) {
            out.push(Connection::resolved(ConnectionKind::Speech, speech_id));
        }
    }
    out
}

/// Synthesizes the single possible connection for a V1.03 option node.
fn migrate_legacy_option(
    record: &SavedOptionNode,
    kinds: &HashMap<NodeId, NodeKind>,
) -> SmallVec<[Connection; 4]> {
    let mut out = SmallVec::new();
    if let Some(speech_id) = record.next_speech_id {
        if kinds.get(&speech_id) == Some(&NodeKind::Speech) {
            out.push(Connection::resolved(ConnectionKind::Speech, speech_id));
        }
    }
    out
}

/// Flattens the live graph into a persistable asset.
///
/// For every node the id-based link fields are regenerated from the live
/// references (replacing whatever was stored before), then the nodes are
/// partitioned into speech/option record lists. The output always carries
/// [`SaveVersion::CURRENT`] and the allocator's counter. Dangling
/// placeholder connections are written out unchanged.
pub fn flatten(conversation: &Conversation) -> SavedConversation {
    let mut speech_nodes = Vec::new();
    let mut option_nodes = Vec::new();

    for node in conversation.iter() {
        let parent_ids: Vec<NodeId> = node.parents().to_vec();
        let connections: Vec<SavedConnection> = node
            .connections()
            .iter()
            .map(|c| SavedConnection {
                kind: c.kind(),
                target: c.target(),
            })
            .collect();

        match &node.content {
            NodeContent::Speech(data) => speech_nodes.push(SavedSpeechNode {
                id: node.id,
                is_root: node.is_root(),
                position: node.position,
                parent_ids,
                connections,
                data: data.clone(),
                option_ids: Vec::new(),
                next_speech_id: None,
            }),
            NodeContent::Option(data) => option_nodes.push(SavedOptionNode {
                id: node.id,
                is_root: node.is_root(),
                position: node.position,
                parent_ids,
                connections,
                data: data.clone(),
                next_speech_id: None,
            }),
        }
    }

    SavedConversation {
        save_version: SaveVersion::CURRENT,
        next_id: conversation.id_counter(),
        defaults: conversation.defaults.clone(),
        parameters: conversation.parameters.clone(),
        speech_nodes,
        option_nodes,
    }
}
