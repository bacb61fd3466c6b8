//! Small filesystem helpers shared by the writer and the coordinator.

use std::io;
use std::path::Path;

/// Permission bits for directories created under the base path.
#[cfg(unix)]
const DIR_MODE: u32 = 0o770;

/// Create `path` and any missing parents, owner/group access only.
pub(crate) async fn create_dir_restricted(path: &Path) -> io::Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);
    builder.create(path).await
}

/// Run a blocking filesystem call off the async workers.
pub(crate) async fn blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| io::Error::other(format!("spawn_blocking failed: {e}")))?
}
