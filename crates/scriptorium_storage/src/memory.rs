//! In-memory artifact storage.

use crate::{ArtifactStore, validate_key};
use scriptorium_error::{ScriptoriumResult, StorageError, StorageErrorKind};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Artifact store held entirely in memory.
///
/// Useful for tests and dry runs; contents vanish when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    artifacts: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored keys in sorted order.
    pub fn keys(&self) -> ScriptoriumResult<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn lock(&self) -> ScriptoriumResult<MutexGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.artifacts.lock().map_err(|e| {
            StorageError::new(StorageErrorKind::Unavailable(format!(
                "artifact map lock poisoned: {}",
                e
            )))
            .into()
        })
    }
}

#[async_trait::async_trait]
impl ArtifactStore for InMemoryStore {
    async fn write(&self, key: &str, contents: &[u8]) -> ScriptoriumResult<()> {
        validate_key(key)?;
        self.lock()?.insert(key.to_string(), contents.to_vec());
        tracing::trace!(key, size = contents.len(), "Stored artifact in memory");
        Ok(())
    }

    async fn read(&self, key: &str) -> ScriptoriumResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.lock()?.get(key).cloned())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
