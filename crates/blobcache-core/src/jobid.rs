//! `JobId` — a stand-in for the runtime's external job identifier type.
//!
//! The real type lives in the job-execution runtime, outside this workspace;
//! it supplies a fixed-width byte representation and nothing else is assumed
//! about it here. Put carries it for provenance only — the on-disk filename
//! remains a pure function of [`crate::BlobKey`].

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::constants::JOBID_SIZE;
use crate::error::{Error, Result};

/// Fixed-width job identifier carried by `put` for provenance only.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct JobId([u8; JOBID_SIZE]);

impl JobId {
    /// Wrap a fixed-width byte buffer.
    pub fn from_bytes(bytes: [u8; JOBID_SIZE]) -> Self {
        JobId(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; JOBID_SIZE] {
        &self.0
    }

    /// Hex rendering, used only for log lines.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Read exactly [`JOBID_SIZE`] bytes off an async reader.
    pub async fn read_from<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; JOBID_SIZE];
        reader
            .read_exact(&mut buf)
            .await
            .map_err(|_| Error::UnexpectedEof)?;
        Ok(JobId(buf))
    }

    /// Write the raw bytes to an async writer.
    pub async fn write_to<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.0).await?;
        Ok(())
    }
}

impl std::fmt::Debug for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JobId({})", self.to_hex())
    }
}
