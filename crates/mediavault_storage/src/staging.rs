//! Streaming uploads into an isolated staging area.

use crate::fs::{blocking, create_dir_restricted};
use crate::{ContentHash, HashingWriter, MediaMetadata};
use mediavault_error::{MediavaultResult, StorageError, StorageErrorKind};
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufWriter};

/// Directory under the base path that holds staging areas.
pub const STAGING_DIR: &str = "tmp";

/// Name of the staged file inside a staging area.
pub const CONTENT_FILE: &str = "content";

/// A uniquely named directory under `<base>/tmp/` holding one upload.
///
/// The area is owned by the upload that created it. [`commit`](crate::commit)
/// removes it explicitly and reports removal failures; if the area is
/// dropped instead (a failed write, a cancelled task) it is removed on a
/// best-effort basis.
#[derive(Debug)]
pub struct StagingArea {
    dir: tempfile::TempDir,
}

impl StagingArea {
    /// Allocate a fresh staging area under `base_dir`.
    async fn create(base_dir: &Path) -> MediavaultResult<Self> {
        let root = base_dir.join(STAGING_DIR);
        create_dir_restricted(&root).await.map_err(|e| {
            StorageError::new(StorageErrorKind::WriteFailure(format!(
                "create {}: {}",
                root.display(),
                e
            )))
        })?;

        let dir = tempfile::Builder::new()
            .prefix("upload-")
            .tempdir_in(&root)
            .map_err(|e| {
                StorageError::new(StorageErrorKind::WriteFailure(format!(
                    "allocate staging directory in {}: {}",
                    root.display(),
                    e
                )))
            })?;

        Ok(Self { dir })
    }

    /// Directory of this staging area.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the staged file.
    pub fn content_path(&self) -> PathBuf {
        self.dir.path().join(CONTENT_FILE)
    }

    /// Delete the staging area and everything left in it.
    pub(crate) async fn remove(self) -> io::Result<()> {
        let dir = self.dir;
        blocking(move || dir.close()).await
    }
}

/// Result of [`write_staged`]: what was written and where.
#[derive(Debug)]
pub struct StagedUpload {
    /// Hash and size of the staged bytes
    pub metadata: MediaMetadata,
    /// Staging area holding the bytes
    pub staging: StagingArea,
}

/// Stream `reader` into a new staging area under `base_dir`.
///
/// At most `max_bytes` bytes are read. A longer source is truncated, not
/// rejected: only its first `max_bytes` bytes are hashed and staged, and the
/// reported size is what was actually written. All buffered bytes are flushed
/// and synced before the hash is reported.
///
/// # Errors
///
/// `WriteFailure` if the staging area cannot be created or the copy fails
/// for any reason other than end of stream. The staging area is removed
/// before the error is returned.
#[tracing::instrument(skip(reader, base_dir), fields(base = %base_dir.display()))]
pub async fn write_staged<R>(
    reader: R,
    max_bytes: u64,
    base_dir: &Path,
) -> MediavaultResult<StagedUpload>
where
    R: AsyncRead + Unpin,
{
    let staging = StagingArea::create(base_dir).await?;
    let content_path = staging.content_path();

    match stream_into(reader.take(max_bytes), &content_path).await {
        Ok((content_hash, size_bytes)) => Ok(StagedUpload {
            metadata: MediaMetadata {
                content_hash,
                size_bytes,
            },
            staging,
        }),
        Err(e) => {
            tracing::debug!(dir = %staging.path().display(), error = %e, "Staging failed");
            Err(StorageError::new(StorageErrorKind::WriteFailure(format!(
                "{}: {}",
                content_path.display(),
                e
            )))
            .into())
        }
    }
}

async fn stream_into<R>(mut reader: R, path: &Path) -> io::Result<(ContentHash, u64)>
where
    R: AsyncRead + Unpin,
{
    let file = tokio::fs::File::create(path).await?;
    let mut writer = HashingWriter::new(BufWriter::new(file));

    let written = tokio::io::copy(&mut reader, &mut writer).await?;
    writer.flush().await?;

    let (buffered, hash) = writer.finalize();
    buffered.into_inner().sync_all().await?;

    Ok((hash, written))
}
