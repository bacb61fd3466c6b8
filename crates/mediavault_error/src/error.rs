//! Top-level error wrapper types.

use crate::{ConfigError, StorageError, StorageErrorKind};

/// Every error a mediavault operation can surface.
///
/// # Examples
///
/// ```
/// use mediavault_error::{ConfigError, MediavaultError};
///
/// let err: MediavaultError = ConfigError::new("missing base_path").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum MediavaultErrorKind {
    /// Storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Mediavault error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Mediavault Error: {}", _0)]
pub struct MediavaultError(Box<MediavaultErrorKind>);

impl MediavaultError {
    /// Create a new error from a kind.
    pub fn new(kind: MediavaultErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &MediavaultErrorKind {
        &self.0
    }

    /// The storage error kind, if this is a storage error.
    pub fn storage_kind(&self) -> Option<&StorageErrorKind> {
        match self.kind() {
            MediavaultErrorKind::Storage(e) => Some(&e.kind),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to MediavaultErrorKind
impl<T> From<T> for MediavaultError
where
    T: Into<MediavaultErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for mediavault operations.
pub type MediavaultResult<T> = std::result::Result<T, MediavaultError>;
