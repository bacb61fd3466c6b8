//! Structured events emitted by storage operations.

use crate::ContentHash;
use std::path::Path;

/// Something that happened to an upload or to the staging tree.
#[derive(Debug)]
pub enum StorageEvent<'a> {
    /// An upload was fully written to its staging area.
    Staged {
        /// Staging directory
        dir: &'a Path,
        /// Hash of the staged bytes
        hash: &'a ContentHash,
        /// Staged size
        size_bytes: u64,
    },
    /// Staged content was moved to its final location.
    Committed {
        /// Final path
        path: &'a Path,
        /// Content hash
        hash: &'a ContentHash,
        /// Size in bytes
        size_bytes: u64,
    },
    /// Identical content was already stored; nothing was moved.
    Duplicate {
        /// Path of the existing blob
        path: &'a Path,
        /// Content hash
        hash: &'a ContentHash,
        /// Size in bytes
        size_bytes: u64,
    },
    /// A staging directory could not be removed. The operation itself was
    /// not failed because of this.
    CleanupFailed {
        /// Directory left behind
        dir: &'a Path,
        /// Why removal failed
        error: &'a std::io::Error,
    },
    /// An abandoned staging directory was removed by a sweep.
    Swept {
        /// Directory removed
        dir: &'a Path,
    },
}

/// Sink for [`StorageEvent`]s.
///
/// Storage code reports through this instead of logging directly, so tests
/// can assert on cleanup failures and callers can route events into metrics.
pub trait StorageObserver: Send + Sync {
    /// Record an event.
    fn observe(&self, event: &StorageEvent<'_>);
}

/// Default observer: forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl StorageObserver for TracingObserver {
    fn observe(&self, event: &StorageEvent<'_>) {
        match event {
            StorageEvent::Staged {
                dir,
                hash,
                size_bytes,
            } => {
                tracing::debug!(dir = %dir.display(), hash = %hash, size = size_bytes, "Staged upload");
            }
            StorageEvent::Committed {
                path,
                hash,
                size_bytes,
            } => {
                tracing::info!(path = %path.display(), hash = %hash, size = size_bytes, "Stored media file");
            }
            StorageEvent::Duplicate {
                path,
                hash,
                size_bytes,
            } => {
                tracing::debug!(
                    path = %path.display(),
                    hash = %hash,
                    size = size_bytes,
                    "Media already exists, returning existing path"
                );
            }
            StorageEvent::CleanupFailed { dir, error } => {
                tracing::warn!(dir = %dir.display(), error = %error, "Failed to remove directory");
            }
            StorageEvent::Swept { dir } => {
                tracing::info!(dir = %dir.display(), "Removed abandoned staging directory");
            }
        }
    }
}
