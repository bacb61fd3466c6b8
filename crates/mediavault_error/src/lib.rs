//! Error types for mediavault.
//!
//! # Error Hierarchy
//!
//! Errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - Constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use mediavault_error::{MediavaultResult, StorageError, StorageErrorKind};
//!
//! fn derive() -> MediavaultResult<String> {
//!     Err(StorageError::new(StorageErrorKind::InvalidHash("empty".to_string())))?
//! }
//!
//! let err = derive().unwrap_err();
//! assert!(matches!(err.storage_kind(), Some(StorageErrorKind::InvalidHash(_))));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod storage;

pub use config::ConfigError;
pub use error::{MediavaultError, MediavaultErrorKind, MediavaultResult};
pub use storage::{StorageError, StorageErrorKind};
