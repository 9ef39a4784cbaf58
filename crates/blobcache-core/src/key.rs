//! `BlobKey` — the 20-byte SHA-1 content identifier.

use std::fmt;
use std::str::FromStr;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::constants::BLOBKEY_SIZE;
use crate::error::{Error, Result};

/// A content-addressable identifier: the SHA-1 digest of a blob's bytes.
///
/// For every blob successfully stored by this workspace, `key ==
/// sha1(contents)` holds — callers never choose a key directly.
#[derive(Clone, Copy, Eq, Hash)]
pub struct BlobKey([u8; BLOBKEY_SIZE]);

impl BlobKey {
    /// The all-zero key. Represents "no key chosen yet"; a `get` against it
    /// always fails with [`Error::NotFound`].
    pub const ZERO: BlobKey = BlobKey([0u8; BLOBKEY_SIZE]);

    /// Build a key from exactly [`BLOBKEY_SIZE`] bytes.
    pub fn from_bytes(bytes: [u8; BLOBKEY_SIZE]) -> Self {
        BlobKey(bytes)
    }

    /// Build a key from a byte slice, failing unless the length matches.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != BLOBKEY_SIZE {
            return Err(Error::InvalidKeySize {
                expected: BLOBKEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut buf = [0u8; BLOBKEY_SIZE];
        buf.copy_from_slice(bytes);
        Ok(BlobKey(buf))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; BLOBKEY_SIZE] {
        &self.0
    }

    /// `true` if this is the all-zero key.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; BLOBKEY_SIZE]
    }

    /// 40-character lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The storage filename for this key: `blob_<hex>`.
    pub fn storage_filename(&self) -> String {
        format!("{}{}", crate::constants::BLOB_PREFIX, self.to_hex())
    }

    /// Read exactly [`BLOBKEY_SIZE`] bytes off an async reader.
    ///
    /// Fails with [`Error::UnexpectedEof`] if the stream ends early.
    pub async fn read_from<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; BLOBKEY_SIZE];
        reader
            .read_exact(&mut buf)
            .await
            .map_err(|_| Error::UnexpectedEof)?;
        Ok(BlobKey(buf))
    }

    /// Write the raw 20 bytes to an async writer.
    pub async fn write_to<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.0).await?;
        Ok(())
    }
}

impl PartialEq for BlobKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for BlobKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BlobKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Bytes compare as unsigned already — u8 has no sign.
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobKey({})", self.to_hex())
    }
}

impl FromStr for BlobKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let decoded = hex::decode(s).map_err(|e| {
            Error::ProtocolViolation(format!("invalid hex blob key {s:?}: {e}"))
        })?;
        BlobKey::from_slice(&decoded)
    }
}
