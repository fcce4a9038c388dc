//! Keyed artifact storage for Scriptorium runs.
//!
//! Every file a run reads or produces (concept, outline, scene drafts,
//! evaluations, assembled scripts) goes through an [`ArtifactStore`] under a
//! relative, `/`-separated key such as `sub_scenes/sub_scene_3.json`.
//!
//! # Example
//!
//! ```rust
//! use scriptorium_storage::{ArtifactStore, ArtifactStoreExt, FileSystemStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileSystemStore::new("/tmp/scriptorium-output")?;
//!
//! store.write_text("script_initial.md", "# Act 1\n").await?;
//! let script = store.read_text("script_initial.md").await?;
//! assert_eq!(script.as_deref(), Some("# Act 1\n"));
//!
//! // Missing artifacts are not errors
//! assert!(store.read_text("style_guide.md").await?.is_none());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use scriptorium_error::{JsonError, ScriptoriumResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Component, Path, PathBuf};

mod filesystem;
mod memory;

pub use filesystem::FileSystemStore;
pub use memory::InMemoryStore;
pub use scriptorium_error::{StorageError, StorageErrorKind};

/// Trait for pluggable artifact storage backends.
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write an artifact, replacing any previous contents.
    ///
    /// Readers never observe a partially written artifact.
    async fn write(&self, key: &str, contents: &[u8]) -> ScriptoriumResult<()>;

    /// Read an artifact.
    ///
    /// # Returns
    ///
    /// `None` if no artifact exists under `key`
    async fn read(&self, key: &str) -> ScriptoriumResult<Option<Vec<u8>>>;

    /// Check whether an artifact exists.
    async fn exists(&self, key: &str) -> ScriptoriumResult<bool> {
        Ok(self.read(key).await?.is_some())
    }

    /// Backend name for logging (e.g., "filesystem", "memory").
    fn backend_name(&self) -> &'static str;
}

/// Text and JSON conveniences over any [`ArtifactStore`].
#[async_trait::async_trait]
pub trait ArtifactStoreExt: ArtifactStore {
    /// Write a UTF-8 text artifact.
    async fn write_text(&self, key: &str, text: &str) -> ScriptoriumResult<()> {
        self.write(key, text.as_bytes()).await
    }

    /// Read a UTF-8 text artifact.
    async fn read_text(&self, key: &str) -> ScriptoriumResult<Option<String>> {
        match self.read(key).await? {
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|e| {
                StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", key, e))).into()
            }),
            None => Ok(None),
        }
    }

    /// Write a value as pretty-printed JSON.
    async fn write_json<T>(&self, key: &str, value: &T) -> ScriptoriumResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| JsonError::new(format!("serialize {}: {}", key, e)))?;
        self.write_text(key, &text).await
    }

    /// Read a JSON artifact into `T`.
    async fn read_json<T>(&self, key: &str) -> ScriptoriumResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.read_text(key).await? {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| JsonError::new(format!("parse {}: {}", key, e)).into()),
            None => Ok(None),
        }
    }
}

impl<S: ArtifactStore + ?Sized> ArtifactStoreExt for S {}

#[async_trait::async_trait]
impl<S: ArtifactStore + ?Sized> ArtifactStore for std::sync::Arc<S> {
    async fn write(&self, key: &str, contents: &[u8]) -> ScriptoriumResult<()> {
        (**self).write(key, contents).await
    }

    async fn read(&self, key: &str) -> ScriptoriumResult<Option<Vec<u8>>> {
        (**self).read(key).await
    }

    async fn exists(&self, key: &str) -> ScriptoriumResult<bool> {
        (**self).exists(key).await
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}

/// Check that a key is a non-empty relative path that stays under the root.
pub(crate) fn validate_key(key: &str) -> ScriptoriumResult<PathBuf> {
    let path = Path::new(key);
    let stays_inside = path
        .components()
        .all(|component| matches!(component, Component::Normal(_)));

    if key.trim().is_empty() || !stays_inside {
        return Err(StorageError::new(StorageErrorKind::InvalidKey(key.to_string())).into());
    }
    Ok(path.to_path_buf())
}
