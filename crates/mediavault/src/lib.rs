//! mediavault - content-addressed media blob storage.
//!
//! Uploads are hashed while they stream to disk and land at a path derived
//! from their SHA-256, so identical uploads are stored once.
//!
//! # Architecture
//!
//! - `mediavault_error` - Error types
//! - `mediavault_storage` - Path derivation, staged writes, atomic commits
//!
//! This crate re-exports both and provides the `mediavault` binary.

pub mod cli;

pub use mediavault_error::*;
pub use mediavault_storage::*;
