//! Filesystem-backed content store.

use crate::{
    CommitOutcome, ContentHash, ContentStore, STAGING_DIR, StorageConfig, StorageEvent,
    StorageObserver, StoredMedia, TracingObserver, commit, derive_path, write_staged,
};
use mediavault_error::{MediavaultResult, StorageError, StorageErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::io::AsyncRead;

/// Content-addressed store rooted at a base directory.
///
/// Stores blobs at `{base_path}/{hash[0]}/{hash[1]}/{hash[2..]}` and stages
/// uploads under `{base_path}/tmp/`. Cloning is cheap; clones share only the
/// immutable configuration and the observer.
#[derive(Clone)]
pub struct FileSystemStore {
    base_path: PathBuf,
    max_file_size_bytes: u64,
    observer: Arc<dyn StorageObserver>,
}

impl std::fmt::Debug for FileSystemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSystemStore")
            .field("base_path", &self.base_path)
            .field("max_file_size_bytes", &self.max_file_size_bytes)
            .finish_non_exhaustive()
    }
}

impl FileSystemStore {
    /// Create a store from validated configuration.
    ///
    /// Creates the base directory if it doesn't exist and resolves it to an
    /// absolute path.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the directory cannot
    /// be created or resolved.
    #[tracing::instrument(skip(config), fields(path = %config.base_path().display()))]
    pub fn new(config: &StorageConfig) -> MediavaultResult<Self> {
        config.validate()?;

        let base_path = config.base_path();
        std::fs::create_dir_all(base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;
        let base_path = std::path::absolute(base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Opened filesystem storage");
        Ok(Self {
            base_path,
            max_file_size_bytes: *config.max_file_size_bytes(),
            observer: Arc::new(TracingObserver),
        })
    }

    /// Replace the default `tracing` observer.
    pub fn with_observer(mut self, observer: Arc<dyn StorageObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Root directory of the store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Upload size limit.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_bytes
    }

    /// Location a blob with `hash` has (or would have).
    pub fn path_for(&self, hash: &ContentHash) -> MediavaultResult<PathBuf> {
        derive_path(hash.as_str(), &self.base_path)
    }

    /// Remove staging directories older than `older_than`.
    ///
    /// A crash between staging and commit leaves its staging directory
    /// behind. Pick a threshold well above the longest upload, or an
    /// in-flight upload will lose its staged file.
    ///
    /// Returns the number of directories removed. Directories that cannot be
    /// removed are reported to the observer and skipped.
    #[tracing::instrument(skip(self), fields(base = %self.base_path.display()))]
    pub async fn sweep_staging(&self, older_than: Duration) -> MediavaultResult<usize> {
        let root = self.base_path.join(STAGING_DIR);
        let mut entries = match tokio::fs::read_dir(&root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    root.display(),
                    e
                )))
                .into());
            }
        };

        let now = SystemTime::now();
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", root.display(), e)))
        })? {
            let dir = entry.path();
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if !meta.is_dir() {
                continue;
            }
            let age = meta
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age < older_than {
                continue;
            }

            match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => {
                    removed += 1;
                    self.observer.observe(&StorageEvent::Swept { dir: &dir });
                }
                Err(error) => {
                    self.observer.observe(&StorageEvent::CleanupFailed {
                        dir: &dir,
                        error: &error,
                    });
                }
            }
        }

        Ok(removed)
    }
}

#[async_trait::async_trait]
impl ContentStore for FileSystemStore {
    #[tracing::instrument(skip(self, reader), fields(base = %self.base_path.display(), limit = self.max_file_size_bytes))]
    async fn store(
        &self,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> MediavaultResult<StoredMedia> {
        let staged = write_staged(reader, self.max_file_size_bytes, &self.base_path).await?;
        self.observer.observe(&StorageEvent::Staged {
            dir: staged.staging.path(),
            hash: &staged.metadata.content_hash,
            size_bytes: staged.metadata.size_bytes,
        });

        let metadata = staged.metadata;
        let CommitOutcome { path, duplicate } =
            commit(staged.staging, &metadata, &self.base_path, &*self.observer).await?;

        Ok(StoredMedia {
            content_hash: metadata.content_hash,
            size_bytes: metadata.size_bytes,
            path,
            duplicate,
        })
    }

    #[tracing::instrument(skip(self, hash), fields(hash = %hash))]
    async fn retrieve(&self, hash: &ContentHash) -> MediavaultResult<Vec<u8>> {
        let path = self.path_for(hash)?;

        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(path.display().to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        let actual = ContentHash::of_bytes(&data);
        if &actual != hash {
            return Err(StorageError::new(StorageErrorKind::IntegrityMismatch(format!(
                "{} hashes to {}, expected {}",
                path.display(),
                actual,
                hash
            )))
            .into());
        }

        tracing::debug!(path = %path.display(), size = data.len(), "Retrieved media file");
        Ok(data)
    }

    #[tracing::instrument(skip(self, hash), fields(hash = %hash))]
    async fn exists(&self, hash: &ContentHash) -> MediavaultResult<bool> {
        let path = self.path_for(hash)?;
        tokio::fs::try_exists(&path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into()
        })
    }

    #[tracing::instrument(skip(self, hash), fields(hash = %hash))]
    async fn delete(&self, hash: &ContentHash) -> MediavaultResult<()> {
        let path = self.path_for(hash)?;

        tokio::fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(path.display().to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "delete {}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        tracing::info!(path = %path.display(), "Deleted media file");
        Ok(())
    }
}
