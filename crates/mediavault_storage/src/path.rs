//! Mapping content hashes to sharded storage paths.

use crate::STAGING_DIR;
use mediavault_error::{MediavaultResult, StorageError, StorageErrorKind};
use std::path::{Component, Path, PathBuf};

/// Longest hash, in characters, accepted by [`derive_path`].
pub const MAX_HASH_LEN: usize = 255;

/// Derive the storage path for `hash` under `base_dir`.
///
/// The first two characters become one directory level each and the rest is
/// the file name, so `"qwerty"` maps to `<base_dir>/q/w/erty`. Shorter hashes
/// get fewer levels: `"ab"` maps to `<base_dir>/a/b` and `"a"` to
/// `<base_dir>/a`.
///
/// The result is absolute and lexically normalized, and is checked to be a
/// strict descendant of `base_dir` component by component, so a hash
/// carrying `..` or a leading separator cannot reach outside the base, and a
/// base of `/data/store` never accepts `/data/storeX`. Paths under the
/// `tmp/` staging directory are refused as well.
///
/// This never touches the filesystem. Symlinks inside the base are checked
/// separately by [`ensure_contained`].
///
/// # Errors
///
/// - `InvalidHash` for an empty hash or one longer than [`MAX_HASH_LEN`]
/// - `PathEscape` if the derived path is not strictly inside `base_dir`, or
///   lands in its staging directory
///
/// # Example
///
/// ```
/// use mediavault_storage::derive_path;
/// use std::path::Path;
///
/// let path = derive_path("ab1234", Path::new("/data/media")).unwrap();
/// assert_eq!(path, Path::new("/data/media/a/b/1234"));
/// ```
pub fn derive_path(hash: &str, base_dir: &Path) -> MediavaultResult<PathBuf> {
    let len = hash.chars().count();
    if len == 0 {
        return Err(StorageError::new(StorageErrorKind::InvalidHash("empty".to_string())).into());
    }
    if len > MAX_HASH_LEN {
        return Err(StorageError::new(StorageErrorKind::InvalidHash(format!(
            "too long: {} characters, max {}",
            len, MAX_HASH_LEN
        )))
        .into());
    }

    let base = std::path::absolute(base_dir).map_err(|e| {
        StorageError::new(StorageErrorKind::PathEscape(format!(
            "cannot resolve base directory {}: {}",
            base_dir.display(),
            e
        )))
    })?;
    let base = normalize(&base);

    let candidate = normalize(&base.join(shard(hash).join("/")));
    if candidate == base || !candidate.starts_with(&base) {
        return Err(StorageError::new(StorageErrorKind::PathEscape(format!(
            "{} is not inside {}",
            candidate.display(),
            base.display()
        )))
        .into());
    }
    if candidate.starts_with(base.join(STAGING_DIR)) {
        return Err(StorageError::new(StorageErrorKind::PathEscape(format!(
            "{} is inside the staging area",
            candidate.display()
        )))
        .into());
    }

    Ok(candidate)
}

/// Split a hash into at most two single-character directories and a file name.
fn shard(hash: &str) -> Vec<&str> {
    let boundaries: Vec<usize> = hash.char_indices().map(|(i, _)| i).take(3).collect();
    match boundaries.as_slice() {
        [_, second, third] => vec![&hash[..*second], &hash[*second..*third], &hash[*third..]],
        [_, second] => vec![&hash[..*second], &hash[*second..]],
        _ => vec![hash],
    }
}

/// Resolve `.` and `..` without consulting the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Check that `path` cannot leave `base_dir` through a symlink.
///
/// Canonicalizes the base and the nearest existing ancestor of `path` (or
/// `path` itself if it exists) and requires the latter to lie inside the
/// former. Run this right before creating directories for a derived path.
///
/// # Errors
///
/// - `PathEscape` if an existing ancestor resolves outside the base
/// - `MoveFailure` if the base or an ancestor cannot be inspected
#[tracing::instrument(skip_all, fields(path = %path.display(), base = %base_dir.display()))]
pub async fn ensure_contained(path: &Path, base_dir: &Path) -> MediavaultResult<()> {
    let path = path.to_path_buf();
    let base_dir = base_dir.to_path_buf();
    tokio::task::spawn_blocking(move || ensure_contained_sync(&path, &base_dir))
        .await
        .map_err(|e| {
            StorageError::new(StorageErrorKind::MoveFailure(format!(
                "spawn_blocking failed: {e}"
            )))
        })?
}

fn ensure_contained_sync(path: &Path, base_dir: &Path) -> MediavaultResult<()> {
    let base_canonical = base_dir.canonicalize().map_err(|e| {
        StorageError::new(StorageErrorKind::MoveFailure(format!(
            "failed to canonicalize base {}: {}",
            base_dir.display(),
            e
        )))
    })?;

    let mut ancestor = Some(path);
    while let Some(candidate) = ancestor {
        match std::fs::symlink_metadata(candidate) {
            Ok(_) => {
                let canonical = candidate.canonicalize().map_err(|e| {
                    StorageError::new(StorageErrorKind::PathEscape(format!(
                        "{} cannot be resolved: {}",
                        candidate.display(),
                        e
                    )))
                })?;
                if !canonical.starts_with(&base_canonical) {
                    return Err(StorageError::new(StorageErrorKind::PathEscape(format!(
                        "{} resolves to {} outside {}",
                        candidate.display(),
                        canonical.display(),
                        base_canonical.display()
                    )))
                    .into());
                }
                tracing::trace!(ancestor = %candidate.display(), "Nearest existing ancestor is contained");
                return Ok(());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                ancestor = candidate.parent();
            }
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::MoveFailure(format!(
                    "failed to stat {}: {}",
                    candidate.display(),
                    e
                )))
                .into());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_lengths() {
        assert_eq!(shard("q"), vec!["q"]);
        assert_eq!(shard("qw"), vec!["q", "w"]);
        assert_eq!(shard("qwe"), vec!["q", "w", "e"]);
        assert_eq!(shard("qwerty"), vec!["q", "w", "erty"]);
    }

    #[test]
    fn test_shard_respects_char_boundaries() {
        assert_eq!(shard("éßxyz"), vec!["é", "ß", "xyz"]);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), Path::new("/a/c"));
        assert_eq!(normalize(Path::new("/a/../../etc")), Path::new("/etc"));
    }
}
