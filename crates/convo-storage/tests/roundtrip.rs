//! End-to-end persistence tests.
//!
//! These exercise the full path a host editor drives: build a conversation
//! through the session API, save it through a JSON-backed store, reopen it,
//! and check the reconstructed graph. A property test runs arbitrary edit
//! sequences and asserts that flatten/reconstruct is a stable round trip.

use std::collections::HashSet;

use proptest::prelude::*;

use convo_core::{Conversation, NodeId};
use convo_storage::{
    flatten, reconstruct, EditorSession, InMemoryNodeDataStore, JsonAssetStore, SaveVersion,
};

// ---------------------------------------------------------------------------
// Scripted end-to-end scenario
// ---------------------------------------------------------------------------

#[test]
fn edit_save_reopen_preserves_structure_and_payloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quest_giver.json");

    let (root, yes, no, reward) = {
        let mut session = EditorSession::open(
            JsonAssetStore::new(&path),
            InMemoryNodeDataStore::<()>::new(),
        )
        .unwrap();

        let root = session.conversation().root();
        session
            .conversation_mut()
            .get_mut(root)
            .unwrap()
            .as_speech_mut()
            .unwrap()
            .text = "Will you take the job?".to_string();

        let yes = session.create_option(root).unwrap();
        let no = session.create_option(root).unwrap();
        let reward = session.create_speech(yes).unwrap();
        // Both answers eventually converge on the same speech.
        session.connect(no, reward).unwrap();

        session.save().unwrap();
        (root, yes, no, reward)
    };

    let session = EditorSession::open(
        JsonAssetStore::new(&path),
        InMemoryNodeDataStore::<()>::new(),
    )
    .unwrap();
    let convo = session.conversation();

    assert_eq!(convo.len(), 4);
    assert_eq!(convo.root(), root);
    assert_eq!(
        convo.get(root).unwrap().as_speech().unwrap().text,
        "Will you take the job?"
    );

    let root_children: Vec<NodeId> = convo.get(root).unwrap().resolved_children().collect();
    assert_eq!(root_children, vec![yes, no]);

    // The shared child lists both options as parents, each exactly once.
    let reward_parents: Vec<NodeId> = convo.get(reward).unwrap().parents().to_vec();
    assert_eq!(reward_parents, vec![yes, no]);

    // New nodes created after reopen never collide with persisted ids.
    let mut session = session;
    let fresh = session.create_speech(root).unwrap();
    assert!(fresh > reward);
}

#[test]
fn legacy_asset_is_migrated_on_load_and_saved_in_the_current_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.json");

    // A V1.03 asset as the old format wrote it: links live in option_ids and
    // next_speech_id, and there are no connection lists. Node 7 no longer
    // exists; its link must vanish during migration.
    let legacy = serde_json::json!({
        "save_version": "1.03",
        "next_id": 4,
        "defaults": { "name": "Guard" },
        "parameters": [
            { "Bool": { "name": "gate_open", "value": false } }
        ],
        "speech_nodes": [
            {
                "id": 0,
                "is_root": true,
                "position": { "x": 0.0, "y": 0.0 },
                "parent_ids": [],
                "name": "Guard",
                "text": "Halt!",
                "volume": 1.0,
                "advance": { "enabled": false, "show_continue_option": true, "delay_seconds": 1.0 },
                "option_ids": [1, 7],
                "next_speech_id": null
            },
            {
                "id": 2,
                "is_root": false,
                "position": { "x": 300.0, "y": 80.0 },
                "parent_ids": [1],
                "name": "Guard",
                "text": "Pass, then.",
                "volume": 1.0,
                "advance": { "enabled": true, "show_continue_option": false, "delay_seconds": 0.01 }
            }
        ],
        "option_nodes": [
            {
                "id": 1,
                "is_root": false,
                "position": { "x": 150.0, "y": 40.0 },
                "parent_ids": [0],
                "text": "I live here.",
                "next_speech_id": 2
            }
        ]
    });
    std::fs::write(&path, serde_json::to_vec_pretty(&legacy).unwrap()).unwrap();

    let mut session = EditorSession::open(
        JsonAssetStore::new(&path),
        InMemoryNodeDataStore::<()>::new(),
    )
    .unwrap();

    let convo = session.conversation();
    assert_eq!(convo.len(), 3);

    // option_ids became option connections, minus the dead target.
    let root_children: Vec<NodeId> = convo.get(NodeId(0)).unwrap().resolved_children().collect();
    assert_eq!(root_children, vec![NodeId(1)]);
    assert_eq!(convo.get(NodeId(0)).unwrap().connections().len(), 1);

    // next_speech_id became a speech connection.
    let option_children: Vec<NodeId> = convo.get(NodeId(1)).unwrap().resolved_children().collect();
    assert_eq!(option_children, vec![NodeId(2)]);

    // Sub-minimum auto-advance delay was clamped on the way in.
    let advance = convo.get(NodeId(2)).unwrap().as_speech().unwrap().advance;
    assert!(advance.delay_seconds() >= convo_core::MIN_ADVANCE_DELAY);

    // Saving rewrites the asset in the current format with the legacy
    // fields gone.
    session.save().unwrap();
    let rewritten: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(rewritten["save_version"], "1.10");
    assert!(rewritten["speech_nodes"][0].get("option_ids").is_none());
    assert!(rewritten["speech_nodes"][0].get("next_speech_id").is_none());
    assert!(rewritten["speech_nodes"][0]["connections"].is_array());

    let reopened = reconstruct(Some(serde_json::from_value(rewritten).unwrap()));
    assert_eq!(reopened.len(), 3);
}

#[test]
fn flattened_asset_always_carries_the_current_version() {
    let asset = flatten(&Conversation::new());
    assert_eq!(asset.save_version, SaveVersion::CURRENT);
    assert!(!asset.save_version.is_legacy());
}

// ---------------------------------------------------------------------------
// Round-trip property
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Edit {
    Speech(usize),
    Option(usize),
    Connect(usize, usize),
    DeleteConnection(usize, usize),
    DeleteNode(usize),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0usize..64).prop_map(Edit::Speech),
        (0usize..64).prop_map(Edit::Option),
        ((0usize..64), (0usize..64)).prop_map(|(a, b)| Edit::Connect(a, b)),
        ((0usize..64), (0usize..64)).prop_map(|(a, b)| Edit::DeleteConnection(a, b)),
        (0usize..64).prop_map(Edit::DeleteNode),
    ]
}

fn nth_id(convo: &Conversation, n: usize) -> NodeId {
    let ids: Vec<NodeId> = convo.node_ids().collect();
    ids[n % ids.len()]
}

fn apply(convo: &mut Conversation, edit: Edit) {
    match edit {
        Edit::Speech(p) => {
            let parent = nth_id(convo, p);
            let _ = convo.create_speech(parent);
        }
        Edit::Option(p) => {
            let parent = nth_id(convo, p);
            let _ = convo.create_option(parent);
        }
        Edit::Connect(a, b) => {
            let parent = nth_id(convo, a);
            let child = nth_id(convo, b);
            let _ = convo.connect(parent, child);
        }
        Edit::DeleteConnection(a, b) => {
            let parent = nth_id(convo, a);
            let child = nth_id(convo, b);
            let _ = convo.delete_connection(parent, child);
        }
        Edit::DeleteNode(n) => {
            let id = nth_id(convo, n);
            let _ = convo.delete_node(id);
        }
    }
}

proptest! {
    #[test]
    fn flatten_reconstruct_is_a_stable_round_trip(edits in proptest::collection::vec(edit_strategy(), 0..50)) {
        let mut convo = Conversation::new();
        for edit in edits {
            apply(&mut convo, edit);
        }

        let once = flatten(&convo);
        let rebuilt = reconstruct(Some(once.clone()));
        let twice = flatten(&rebuilt);

        // Reconstruction is lossless for graphs the editor can produce.
        prop_assert_eq!(&once, &twice);

        // The rebuilt graph has the same node set and the same counter.
        let before: HashSet<NodeId> = convo.node_ids().collect();
        let after: HashSet<NodeId> = rebuilt.node_ids().collect();
        prop_assert_eq!(before, after);
        prop_assert_eq!(convo.id_counter(), rebuilt.id_counter());
        prop_assert_eq!(convo.root(), rebuilt.root());
    }
}
