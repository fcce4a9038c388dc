//! Filesystem-based artifact storage.

use crate::{ArtifactStore, validate_key};
use scriptorium_error::{ScriptoriumResult, StorageError, StorageErrorKind};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Filesystem storage backend.
///
/// Keys map directly onto paths below the root:
///
/// ```text
/// output/
/// ├── outline.json
/// ├── script_initial.md
/// └── sub_scenes/
///     ├── sub_scene_1.json
///     ├── sub_scene_1.md
///     └── up_to_scene/
///         └── 1.md
/// ```
///
/// Writes go to a sibling temp file that is then renamed over the target.
#[derive(Debug, Clone)]
pub struct FileSystemStore {
    root: PathBuf,
}

impl FileSystemStore {
    /// Create a new filesystem store.
    ///
    /// Creates the root directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip(root))]
    pub fn new(root: impl Into<PathBuf>) -> ScriptoriumResult<Self> {
        let root = root.into();

        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;

        tracing::debug!(path = %root.display(), "Opened filesystem store");
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a key.
    pub fn path_for(&self, key: &str) -> ScriptoriumResult<PathBuf> {
        Ok(self.root.join(validate_key(key)?))
    }

    fn temp_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("artifact"));
        name.push(".tmp");
        path.with_file_name(name)
    }
}

#[async_trait::async_trait]
impl ArtifactStore for FileSystemStore {
    #[tracing::instrument(skip(self, contents), fields(size = contents.len()))]
    async fn write(&self, key: &str, contents: &[u8]) -> ScriptoriumResult<()> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let temp_path = Self::temp_path(&path);
        tokio::fs::write(&temp_path, contents).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        tracing::debug!(path = %path.display(), "Wrote artifact");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn read(&self, key: &str) -> ScriptoriumResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;

        match tokio::fs::read(&path).await {
            Ok(data) => {
                tracing::debug!(path = %path.display(), size = data.len(), "Read artifact");
                Ok(Some(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into()),
        }
    }

    async fn exists(&self, key: &str) -> ScriptoriumResult<bool> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await.unwrap_or(false))
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}
