//! Content hashes and the streaming hasher that produces them.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

/// URL-safe, unpadded base64 encoding of a SHA-256 digest.
///
/// Hashes produced by this crate are always 43 characters. Values arriving
/// from elsewhere (a database row, a request path) are not trusted: they are
/// validated when a path is derived from them.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap an already-encoded hash.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encode a raw digest.
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(URL_SAFE_NO_PAD.encode(digest))
    }

    /// Hash an in-memory buffer.
    pub fn of_bytes(data: &[u8]) -> Self {
        Self::from_digest(&Sha256::digest(data))
    }

    /// The encoded hash.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContentHash {
    fn from(encoded: &str) -> Self {
        Self::new(encoded)
    }
}

/// Hash and size of an upload, as handed from the writer to the coordinator.
///
/// This is the point where a caller could present values that do not
/// describe the staged file; [`commit`](crate::commit) checks them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Hash of the staged bytes
    pub content_hash: ContentHash,
    /// Number of staged bytes
    pub size_bytes: u64,
}

/// Writer adapter that hashes every byte the inner writer accepts.
pub struct HashingWriter<W> {
    writer: W,
    hasher: Sha256,
}

impl<W> HashingWriter<W> {
    /// Wrap `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            hasher: Sha256::new(),
        }
    }

    /// Consume the adapter, returning the inner writer and the hash of
    /// everything written through it.
    pub fn finalize(self) -> (W, ContentHash) {
        let digest = self.hasher.finalize();
        (self.writer, ContentHash::from_digest(&digest))
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for HashingWriter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        match Pin::new(&mut this.writer).poll_write(cx, buf) {
            Poll::Ready(Ok(written)) => {
                // Only the prefix the writer took; the rest is offered again.
                this.hasher.update(&buf[..written]);
                Poll::Ready(Ok(written))
            }
            other => other,
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().writer).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().writer).poll_shutdown(cx)
    }
}
