//! Storage error types.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Hash is empty, too long, or otherwise unusable as a storage key
    #[display("Invalid content hash: {}", _0)]
    InvalidHash(String),
    /// Derived path would leave the base directory
    #[display("Path escapes base directory: {}", _0)]
    PathEscape(String),
    /// I/O failure while staging an upload
    #[display("Failed to write staged content: {}", _0)]
    WriteFailure(String),
    /// Staged file does not match the metadata presented at commit time
    #[display("Staged content does not match metadata: {}", _0)]
    MetadataMismatch(String),
    /// A different-sized file already occupies the derived path
    #[display(
        "Hash collision at {path}: existing file has {existing_size} bytes, upload declares {declared_size}"
    )]
    HashCollisionMismatch {
        /// Path of the pre-existing file
        path: String,
        /// Size of the pre-existing file
        existing_size: u64,
        /// Size declared for the new upload
        declared_size: u64,
    },
    /// Directory creation or rename failed while committing
    #[display("Failed to move content into place: {}", _0)]
    MoveFailure(String),
    /// Failed to create storage directory
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to write or remove file
    #[display("Failed to write file: {}", _0)]
    FileWrite(String),
    /// Failed to read file
    #[display("Failed to read file: {}", _0)]
    FileRead(String),
    /// Content not found at the derived location
    #[display("Content not found: {}", _0)]
    NotFound(String),
    /// Stored bytes no longer hash to their key
    #[display("Integrity check failed: {}", _0)]
    IntegrityMismatch(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use mediavault_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("/data/media/a/b/cd".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
