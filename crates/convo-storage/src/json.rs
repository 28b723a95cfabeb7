//! JSON file backend for the conversation asset.
//!
//! One conversation per file, written pretty-printed so assets diff cleanly
//! under version control. A missing file reads as "no conversation yet";
//! malformed JSON is an error, not an empty conversation, so a corrupt asset
//! never gets silently overwritten.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StorageError;
use crate::traits::AssetStore;
use crate::types::SavedConversation;

/// Asset store persisting the flattened conversation as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonAssetStore {
    path: PathBuf,
}

impl JsonAssetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonAssetStore { path: path.into() }
    }

    /// The file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AssetStore for JsonAssetStore {
    fn load(&self) -> Result<Option<SavedConversation>, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no asset file yet");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let asset = serde_json::from_slice(&bytes)?;
        Ok(Some(asset))
    }

    fn save(&mut self, asset: &SavedConversation) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(asset)?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "asset written");
        Ok(())
    }
}
