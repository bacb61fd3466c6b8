//! Tests for hash-to-path derivation.

use mediavault_storage::{MAX_HASH_LEN, StorageErrorKind, derive_path, ensure_contained};
use std::path::Path;

const PATH_SAFE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

fn path_safe_hash(len: usize, offset: usize) -> String {
    (0..len)
        .map(|i| PATH_SAFE[(i * 7 + offset) % PATH_SAFE.len()] as char)
        .collect()
}

#[test]
fn test_concrete_scenario() {
    let path = derive_path("ab1234", Path::new("/data/media")).unwrap();
    assert_eq!(path, Path::new("/data/media/a/b/1234"));
}

#[test]
fn test_two_level_sharding() {
    let path = derive_path("qwerty", Path::new("/srv/blobs")).unwrap();
    assert_eq!(path, Path::new("/srv/blobs/q/w/erty"));
}

#[test]
fn test_short_hashes_use_fewer_levels() {
    let base = Path::new("/data/media");
    assert_eq!(derive_path("a", base).unwrap(), Path::new("/data/media/a"));
    assert_eq!(derive_path("ab", base).unwrap(), Path::new("/data/media/a/b"));
    assert_eq!(derive_path("abc", base).unwrap(), Path::new("/data/media/a/b/c"));
}

#[test]
fn test_every_path_safe_length_is_strict_descendant() {
    let base = Path::new("/data/media");
    for len in 1..=MAX_HASH_LEN {
        for offset in [0, 13, 40] {
            let hash = path_safe_hash(len, offset);
            let path = derive_path(&hash, base).unwrap();
            assert!(path.starts_with(base), "{} escaped", path.display());
            assert_ne!(path, base);
            assert!(path.to_string_lossy().ends_with(&hash[hash.len().min(2)..]));
        }
    }
}

#[test]
fn test_empty_hash_rejected() {
    let err = derive_path("", Path::new("/data/media")).unwrap_err();
    assert!(matches!(err.storage_kind(), Some(StorageErrorKind::InvalidHash(_))));
}

#[test]
fn test_overlong_hash_rejected() {
    let base = Path::new("/data/media");
    assert!(derive_path(&path_safe_hash(MAX_HASH_LEN, 0), base).is_ok());

    let err = derive_path(&path_safe_hash(MAX_HASH_LEN + 1, 0), base).unwrap_err();
    assert!(matches!(err.storage_kind(), Some(StorageErrorKind::InvalidHash(_))));
}

#[test]
fn test_traversal_rejected() {
    let base = Path::new("/data/media");
    for hash in ["../../etc", "..", "/etc/passwd", "ab/../../../../x"] {
        let err = derive_path(hash, base).unwrap_err();
        assert!(
            matches!(err.storage_kind(), Some(StorageErrorKind::PathEscape(_))),
            "{hash:?} gave {err}"
        );
    }
}

#[test]
fn test_sibling_directory_sharing_prefix_rejected() {
    // Lexically resolves to /data/storeX/f, which a plain string prefix
    // check against /data/store would accept.
    let err = derive_path("ab/../../../storeX/f", Path::new("/data/store")).unwrap_err();
    assert!(matches!(err.storage_kind(), Some(StorageErrorKind::PathEscape(_))));
}

#[test]
fn test_staging_area_not_addressable() {
    let base = Path::new("/data/media");
    for hash in ["./tmp/upload-x/content", "tm/../../tmp/x", "./tmp"] {
        let err = derive_path(hash, base).unwrap_err();
        assert!(
            matches!(err.storage_kind(), Some(StorageErrorKind::PathEscape(_))),
            "{hash:?} gave {err}"
        );
    }
    assert_eq!(
        derive_path("tmp", base).unwrap(),
        Path::new("/data/media/t/m/p")
    );
}

#[test]
fn test_relative_base_is_made_absolute() {
    let path = derive_path("abc", Path::new("relative/base")).unwrap();
    assert!(path.is_absolute());
    assert!(path.ends_with("relative/base/a/b/c"));
}

#[test]
fn test_multibyte_hash_shards_on_characters() {
    let path = derive_path("éßxyz", Path::new("/data")).unwrap();
    assert_eq!(path, Path::new("/data/é/ß/xyz"));
}

#[tokio::test]
async fn test_ensure_contained_accepts_plain_tree() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = derive_path("abcdef", temp_dir.path()).unwrap();
    ensure_contained(&path, temp_dir.path()).await.unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn test_ensure_contained_rejects_symlinked_shard() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let outside = tempfile::TempDir::new().unwrap();
    std::os::unix::fs::symlink(outside.path(), temp_dir.path().join("a")).unwrap();

    let path = derive_path("abcdef", temp_dir.path()).unwrap();
    let err = ensure_contained(&path, temp_dir.path()).await.unwrap_err();
    assert!(matches!(err.storage_kind(), Some(StorageErrorKind::PathEscape(_))));
}
