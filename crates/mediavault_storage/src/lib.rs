//! Content-addressed blob storage for mediavault.
//!
//! Uploads are streamed into an isolated staging area while their SHA-256 is
//! computed, then renamed into a sharded location derived from that hash.
//!
//! # Layout
//!
//! ```text
//! <base_path>/
//! ├── tmp/
//! │   └── upload-XXXXXX/
//! │       └── content        (in-flight upload)
//! └── q/
//!     └── w/
//!         └── erty...        (blob with hash "qwerty...")
//! ```
//!
//! # Components
//!
//! - [`derive_path`]: maps a [`ContentHash`] to its sharded path under the base
//! - [`write_staged`]: streams a bounded reader into a [`StagingArea`]
//! - [`commit`]: moves staged content into place, detecting duplicates and
//!   collisions, and always removes the staging area
//! - [`FileSystemStore`]: ties the three together behind [`ContentStore`]
//!
//! # Concurrency
//!
//! Nothing is shared between uploads except the directory tree under the base
//! path. Its only synchronization primitive is the no-clobber rename performed
//! by [`commit`]: of several writers racing on the same hash, exactly one
//! creates the blob and the others observe it as a duplicate.
//!
//! # Example
//!
//! ```rust,no_run
//! use mediavault_storage::{ContentStore, FileSystemStore, StorageConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorageConfig::new("/tmp/media", 10 * 1024 * 1024);
//! let store = FileSystemStore::new(&config)?;
//!
//! let mut upload: &[u8] = b"Hello, world!";
//! let stored = store.store(&mut upload).await?;
//! assert!(!stored.duplicate);
//!
//! let data = store.retrieve(&stored.content_hash).await?;
//! assert_eq!(data, b"Hello, world!");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod commit;
mod config;
mod filesystem;
mod fs;
mod hash;
mod observer;
mod path;
mod staging;
mod storage;

pub use commit::{CommitOutcome, commit};
pub use config::StorageConfig;
pub use filesystem::FileSystemStore;
pub use hash::{ContentHash, HashingWriter, MediaMetadata};
pub use mediavault_error::{StorageError, StorageErrorKind};
pub use observer::{StorageEvent, StorageObserver, TracingObserver};
pub use path::{MAX_HASH_LEN, derive_path, ensure_contained};
pub use staging::{CONTENT_FILE, STAGING_DIR, StagedUpload, StagingArea, write_staged};
pub use storage::{ContentStore, StoredMedia};
