pub mod sqlite_store;
pub mod state_store;

pub use sqlite_store::SqliteBlobStore;
pub use state_store::{StateStore, STORE_KEY};

use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Durable key-value blob storage underneath the state store.
///
/// Writes replace the whole value for a key; a reader sees either the new
/// value or the previous one.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process blob store, used by tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing any validation.
    pub fn with_raw(key: &str, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.blobs.write().insert(key.to_string(), value.into());
        store
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.blobs.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
