//! convo-storage: persistence and reconstruction for dialogue conversations.
//!
//! The live graph in `convo-core` holds direct references (deduplicated
//! parent lists, resolved connections) that cannot be serialized as-is. This
//! crate owns the flattened, id-based persisted form and the two engines
//! bridging the representations:
//!
//! - [`convert::flatten`] regenerates the id-based link fields from the live
//!   graph and partitions nodes into speech/option record lists;
//! - [`convert::reconstruct`] rebuilds the live graph from stored records,
//!   re-resolving every reference and migrating V1.03 legacy assets to the
//!   explicit connection-list format on the way in.
//!
//! # Modules
//!
//! - [`error`]: [`StorageError`] with all failure modes
//! - [`types`]: the persisted record types and save versions
//! - [`traits`]: [`AssetStore`] and [`NodeDataStore`] contracts
//! - [`convert`]: flatten/reconstruct engines
//! - [`memory`]: in-memory backends
//! - [`json`]: JSON file backend
//! - [`session`]: [`EditorSession`] orchestration for a host editor

pub mod convert;
pub mod error;
pub mod json;
pub mod memory;
pub mod session;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic use.
pub use convert::{flatten, reconstruct};
pub use error::StorageError;
pub use json::JsonAssetStore;
pub use memory::{InMemoryAssetStore, InMemoryNodeDataStore};
pub use session::EditorSession;
pub use traits::{AssetStore, NodeDataStore};
pub use types::{
    placements, NodePlacement, SaveVersion, SavedConnection, SavedConversation, SavedOptionNode,
    SavedSpeechNode,
};
