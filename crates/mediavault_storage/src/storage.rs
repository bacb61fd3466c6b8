//! Storage trait definition.

use crate::ContentHash;
use mediavault_error::MediavaultResult;
use std::path::PathBuf;
use tokio::io::AsyncRead;

/// Outcome of storing one upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredMedia {
    /// Hash of the stored bytes
    pub content_hash: ContentHash,
    /// Number of stored bytes
    pub size_bytes: u64,
    /// Content-addressed location of the blob
    pub path: PathBuf,
    /// `true` if identical content was already stored
    pub duplicate: bool,
}

/// Content-addressed blob storage as seen by upload and download handlers.
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    /// Stream `reader` into storage, deduplicating by content hash.
    ///
    /// Input beyond the configured size limit is truncated.
    async fn store(
        &self,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> MediavaultResult<StoredMedia>;

    /// Read a blob back, verifying that it still hashes to `hash`.
    async fn retrieve(&self, hash: &ContentHash) -> MediavaultResult<Vec<u8>>;

    /// Check whether a blob is stored under `hash`.
    async fn exists(&self, hash: &ContentHash) -> MediavaultResult<bool>;

    /// Remove the blob stored under `hash`.
    ///
    /// This is how a caller clears a conflicting file after a
    /// `HashCollisionMismatch`; storage never deletes content on its own.
    async fn delete(&self, hash: &ContentHash) -> MediavaultResult<()>;
}
