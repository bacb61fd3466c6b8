//! Moving staged uploads into content-addressed storage.
//!
//! The base directory is the only state shared between concurrent uploads,
//! and there are no locks around it. Two uploads of the same content race
//! between the existence probe and the rename; the rename refuses to replace
//! an existing file, so exactly one of them creates the blob. The loser sees
//! the rename fail with `AlreadyExists` and re-runs the probe against the
//! winner's file, ending up as a duplicate (or as a collision if the sizes
//! differ) rather than as a move failure.

use crate::fs::{blocking, create_dir_restricted};
use crate::path::{derive_path, ensure_contained};
use crate::{MediaMetadata, StagingArea, StorageEvent, StorageObserver};
use mediavault_error::{MediavaultResult, StorageError, StorageErrorKind};
use std::io;
use std::path::{Path, PathBuf};

/// Where committed content ended up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitOutcome {
    /// Content-addressed location of the blob
    pub path: PathBuf,
    /// `true` if the blob already existed and the upload was discarded
    pub duplicate: bool,
}

/// Commit a staged upload to its content-addressed location.
///
/// Steps, with no retries:
///
/// 1. Check the staged file against `metadata`.
/// 2. Derive the final path from the hash and check that no symlink along
///    it leads outside `base_dir`.
/// 3. If a file is already there with the declared size, report a duplicate
///    and leave it alone. A different size is a collision: fail and leave the
///    existing file for the caller to deal with.
/// 4. Otherwise create the parent directories and rename the staged file in,
///    never replacing a file that appeared in the meantime.
///
/// The staging area is removed whatever the outcome. A failed removal is
/// reported to `observer` and does not change the returned result.
///
/// The rename only works within one filesystem. `tmp/` lives under
/// `base_dir`, so this holds unless something is mounted in between; a
/// cross-device rename surfaces as `MoveFailure` and is not emulated with a
/// copy.
///
/// # Errors
///
/// - `MetadataMismatch` if the staged file is missing or its size differs
///   from `metadata.size_bytes`
/// - `InvalidHash` / `PathEscape` from path derivation or containment checks
/// - `HashCollisionMismatch` if a different-sized file holds the path
/// - `MoveFailure` if directory creation or the rename fails
#[tracing::instrument(
    skip_all,
    fields(hash = %metadata.content_hash, size = metadata.size_bytes, base = %base_dir.display())
)]
pub async fn commit(
    staging: StagingArea,
    metadata: &MediaMetadata,
    base_dir: &Path,
    observer: &dyn StorageObserver,
) -> MediavaultResult<CommitOutcome> {
    let result = commit_staged(&staging, metadata, base_dir).await;

    let staging_dir = staging.path().to_path_buf();
    if let Err(error) = staging.remove().await {
        observer.observe(&StorageEvent::CleanupFailed {
            dir: &staging_dir,
            error: &error,
        });
    }

    if let Ok(outcome) = &result {
        let event = if outcome.duplicate {
            StorageEvent::Duplicate {
                path: &outcome.path,
                hash: &metadata.content_hash,
                size_bytes: metadata.size_bytes,
            }
        } else {
            StorageEvent::Committed {
                path: &outcome.path,
                hash: &metadata.content_hash,
                size_bytes: metadata.size_bytes,
            }
        };
        observer.observe(&event);
    }

    result
}

async fn commit_staged(
    staging: &StagingArea,
    metadata: &MediaMetadata,
    base_dir: &Path,
) -> MediavaultResult<CommitOutcome> {
    let content_path = staging.content_path();
    verify_staged(&content_path, metadata.size_bytes).await?;

    let final_path = derive_path(metadata.content_hash.as_str(), base_dir)?;

    // The probe follows symlinks, so containment comes first.
    ensure_contained(&final_path, base_dir).await?;

    if let Some(outcome) = probe_existing(&final_path, metadata.size_bytes).await? {
        return Ok(outcome);
    }

    if let Some(parent) = final_path.parent() {
        create_dir_restricted(parent).await.map_err(|e| {
            StorageError::new(StorageErrorKind::MoveFailure(format!(
                "create {}: {}",
                parent.display(),
                e
            )))
        })?;
    }

    match rename_noclobber(content_path.clone(), final_path.clone()).await {
        Ok(()) => Ok(CommitOutcome {
            path: final_path,
            duplicate: false,
        }),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            tracing::debug!(path = %final_path.display(), "Lost rename race, re-probing destination");
            probe_existing(&final_path, metadata.size_bytes)
                .await?
                .ok_or_else(|| {
                    StorageError::new(StorageErrorKind::MoveFailure(format!(
                        "{} reported as existing but is gone",
                        final_path.display()
                    )))
                    .into()
                })
        }
        Err(e) => Err(StorageError::new(StorageErrorKind::MoveFailure(format!(
            "rename {} to {}: {}",
            content_path.display(),
            final_path.display(),
            e
        )))
        .into()),
    }
}

/// The staged file must exist and have the declared size.
async fn verify_staged(content_path: &Path, declared_size: u64) -> MediavaultResult<()> {
    let staged = tokio::fs::metadata(content_path).await.map_err(|e| {
        StorageError::new(StorageErrorKind::MetadataMismatch(format!(
            "staged file {}: {}",
            content_path.display(),
            e
        )))
    })?;

    if staged.len() != declared_size {
        return Err(StorageError::new(StorageErrorKind::MetadataMismatch(format!(
            "staged file has {} bytes, metadata declares {}",
            staged.len(),
            declared_size
        )))
        .into());
    }
    Ok(())
}

/// `Some` if `path` already holds this content, `None` if it is free.
async fn probe_existing(path: &Path, declared_size: u64) -> MediavaultResult<Option<CommitOutcome>> {
    match tokio::fs::metadata(path).await {
        Ok(existing) if !existing.is_file() => {
            Err(StorageError::new(StorageErrorKind::MoveFailure(format!(
                "{} is occupied by a non-file entry",
                path.display()
            )))
            .into())
        }
        // Same hash and same size is taken as same content.
        Ok(existing) if existing.len() == declared_size => Ok(Some(CommitOutcome {
            path: path.to_path_buf(),
            duplicate: true,
        })),
        Ok(existing) => Err(StorageError::new(StorageErrorKind::HashCollisionMismatch {
            path: path.display().to_string(),
            existing_size: existing.len(),
            declared_size,
        })
        .into()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::new(StorageErrorKind::MoveFailure(format!(
            "probe {}: {}",
            path.display(),
            e
        )))
        .into()),
    }
}

/// Rename `from` to `to`, failing with `AlreadyExists` instead of replacing.
async fn rename_noclobber(from: PathBuf, to: PathBuf) -> io::Result<()> {
    blocking(move || {
        tempfile::TempPath::try_from_path(from)?
            .persist_noclobber(&to)
            .map_err(|e| e.error)
    })
    .await
}
