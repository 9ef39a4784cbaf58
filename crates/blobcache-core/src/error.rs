//! The error taxonomy shared by every blobcache crate.

use std::path::PathBuf;

/// A blobcache operation failure.
///
/// Variant names track the error *kind*, not where it was raised — the same
/// `CorruptTransfer` can come from a client verifying a put trailer or a
/// proxy verifying a fetched blob.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A facade operation was attempted before `init_server`/`init_proxy`.
    #[error("blobcache facade not initialized")]
    NotInitialized,

    /// A facade operation tried to initialize a role while one was already active.
    #[error("blobcache facade already initialized")]
    AlreadyInitialized,

    /// The requested blob does not exist locally (or, for a proxy, after read-through).
    #[error("blob not found")]
    NotFound,

    /// The stream ended in the middle of a frame.
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// An unknown op byte, trailing bytes after a put trailer, or a malformed JobID frame.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// The digest computed after a transfer did not match the expected key.
    #[error("corrupt transfer: expected {expected}, computed {computed}")]
    CorruptTransfer {
        /// Hex of the key the caller expected (or sent).
        expected: String,
        /// Hex of the digest actually computed over the received bytes.
        computed: String,
    },

    /// A [`crate::BlobKey`] was constructed from a slice that was not exactly
    /// [`crate::BLOBKEY_SIZE`] bytes.
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Required length.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// Failed to read a config file.
    #[error("failed to read config {0}: {1}")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    /// Failed to parse a config file as TOML.
    #[error("failed to parse config {0}: {1}")]
    ConfigParse(PathBuf, #[source] toml::de::Error),

    /// Any other filesystem or socket failure.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;
