//! The wire protocol: a minimal binary framing layer on top of a single TCP
//! connection per operation. All multi-byte integers are little-endian.
//!
//! This module is deliberately thin — it knows how to read and write frames,
//! not what a server or client does with them. [`blobcache-role`] composes
//! these primitives into `ServerRole`, `ProxyRole`, and `Client`.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use blobcache_core::constants::{
    CHUNK_TERMINATOR, JOBID_ABSENT, JOBID_PRESENT, OP_GET, OP_PUT, STATUS_HIT, STATUS_MISS,
    TRANSFER_BUFFER_SIZE,
};
use blobcache_core::digest::StreamingDigest;
use blobcache_core::{BlobKey, Error, JobId, Result};

/// The operation a connection carries. Exactly one per connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Store a blob.
    Put,
    /// Fetch a blob.
    Get,
}

impl Op {
    fn to_byte(self) -> u8 {
        match self {
            Op::Put => OP_PUT,
            Op::Get => OP_GET,
        }
    }

    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            OP_PUT => Ok(Op::Put),
            OP_GET => Ok(Op::Get),
            other => Err(Error::ProtocolViolation(format!(
                "unknown op byte 0x{other:02x}"
            ))),
        }
    }
}

/// Write the op byte that starts a connection.
pub async fn write_op<W: AsyncWrite + Unpin>(w: &mut W, op: Op) -> Result<()> {
    w.write_u8(op.to_byte()).await?;
    Ok(())
}

/// Read the op byte that starts a connection.
pub async fn read_op<R: AsyncRead + Unpin>(r: &mut R) -> Result<Op> {
    let byte = read_u8(r).await?;
    Op::from_byte(byte)
}

/// Write the optional JobID frame that follows a put's op byte.
pub async fn write_jobid_frame<W: AsyncWrite + Unpin>(
    w: &mut W,
    job_id: Option<&JobId>,
) -> Result<()> {
    match job_id {
        None => {
            w.write_u8(JOBID_ABSENT).await?;
        }
        Some(id) => {
            w.write_u8(JOBID_PRESENT).await?;
            id.write_to(w).await?;
        }
    }
    Ok(())
}

/// Read the optional JobID frame.
pub async fn read_jobid_frame<R: AsyncRead + Unpin>(r: &mut R) -> Result<Option<JobId>> {
    match read_u8(r).await? {
        JOBID_ABSENT => Ok(None),
        JOBID_PRESENT => Ok(Some(JobId::read_from(r).await?)),
        other => Err(Error::ProtocolViolation(format!(
            "malformed jobid frame marker 0x{other:02x}"
        ))),
    }
}

/// Stream `reader` to `writer` as length-prefixed chunks of at most
/// [`TRANSFER_BUFFER_SIZE`] bytes, updating `digest` as bytes are read, then
/// write the terminator. Used by the put-sending side (`Client`, and a
/// server's local put when the caller hands it a stream).
pub async fn send_put_payload<R, W>(
    reader: &mut R,
    writer: &mut W,
    digest: &mut StreamingDigest,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; TRANSFER_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        digest.update(&buf[..n]);
        write_chunk(writer, &buf[..n]).await?;
    }
    write_terminator(writer).await
}

/// Read a length-prefixed chunk stream off `reader` into `sink`, updating
/// `digest` as bytes arrive, until the terminator is observed. Used by the
/// put-receiving side (a server's network put handler).
pub async fn recv_put_payload<R, W>(
    reader: &mut R,
    sink: &mut W,
    digest: &mut StreamingDigest,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let len = read_chunk_length(reader).await?;
        if len < 0 {
            return Ok(());
        }
        let mut buf = vec![0u8; len as usize];
        reader
            .read_exact(&mut buf)
            .await
            .map_err(|_| Error::UnexpectedEof)?;
        digest.update(&buf);
        sink.write_all(&buf).await?;
    }
}

/// Write one length-prefixed chunk. `payload` must be at most
/// [`TRANSFER_BUFFER_SIZE`] bytes.
pub async fn write_chunk<W: AsyncWrite + Unpin>(w: &mut W, payload: &[u8]) -> Result<()> {
    debug_assert!(payload.len() <= TRANSFER_BUFFER_SIZE);
    w.write_i32_le(payload.len() as i32).await?;
    w.write_all(payload).await?;
    Ok(())
}

/// Write the chunk-stream terminator (a negative length).
pub async fn write_terminator<W: AsyncWrite + Unpin>(w: &mut W) -> Result<()> {
    w.write_i32_le(CHUNK_TERMINATOR).await?;
    Ok(())
}

/// Read a chunk's 4-byte little-endian signed length prefix.
pub async fn read_chunk_length<R: AsyncRead + Unpin>(r: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)
        .await
        .map_err(|_| Error::UnexpectedEof)?;
    Ok(i32::from_le_bytes(buf))
}

/// Write the 20-byte put trailer: the key the server computed.
///
/// The caller is responsible for closing (or shutting down the write half
/// of) the connection immediately after.
pub async fn write_put_trailer<W: AsyncWrite + Unpin>(w: &mut W, key: &BlobKey) -> Result<()> {
    key.write_to(w).await
}

/// Read the put trailer and verify it matches `expected`. Also verifies
/// there are no bytes after the key and before end-of-stream.
pub async fn read_put_trailer_and_verify<R: AsyncRead + Unpin>(
    r: &mut R,
    expected: &BlobKey,
) -> Result<()> {
    let received = BlobKey::read_from(r).await?;
    if received != *expected {
        return Err(Error::CorruptTransfer {
            expected: expected.to_hex(),
            computed: received.to_hex(),
        });
    }
    assert_eos(r).await
}

/// Write the get-request frame: op byte already written by the caller, this
/// writes the 20-byte requested key.
pub async fn write_get_request<W: AsyncWrite + Unpin>(w: &mut W, key: &BlobKey) -> Result<()> {
    key.write_to(w).await
}

/// Read the 20-byte key out of a get request.
pub async fn read_get_request<R: AsyncRead + Unpin>(r: &mut R) -> Result<BlobKey> {
    BlobKey::read_from(r).await
}

/// Write the get-response status byte.
pub async fn write_status<W: AsyncWrite + Unpin>(w: &mut W, hit: bool) -> Result<()> {
    w.write_u8(if hit { STATUS_HIT } else { STATUS_MISS })
        .await?;
    Ok(())
}

/// Read the get-response status byte. `true` means hit (payload follows).
pub async fn read_status<R: AsyncRead + Unpin>(r: &mut R) -> Result<bool> {
    match read_u8(r).await? {
        STATUS_HIT => Ok(true),
        STATUS_MISS => Ok(false),
        other => Err(Error::ProtocolViolation(format!(
            "unknown get-response status byte 0x{other:02x}"
        ))),
    }
}

/// Stream a reader's remaining bytes to a writer in
/// `<= TRANSFER_BUFFER_SIZE`-byte chunks until EOF. Used for the unframed
/// get-response payload, which relies on connection close as its own
/// end-of-stream marker — the server commits the file to disk atomically
/// before streaming, so connection close suffices as end-of-response.
pub async fn stream_to_eof<R, W>(reader: &mut R, writer: &mut W) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; TRANSFER_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(total);
        }
        writer.write_all(&buf[..n]).await?;
        total += n as u64;
    }
}

/// Stream a reader's remaining bytes to a writer until EOF, updating
/// `digest` as bytes arrive. Used by a proxy verifying a fetched blob
/// against the key it requested.
pub async fn copy_verifying<R, W>(
    reader: &mut R,
    writer: &mut W,
    digest: &mut StreamingDigest,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; TRANSFER_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(total);
        }
        digest.update(&buf[..n]);
        writer.write_all(&buf[..n]).await?;
        total += n as u64;
    }
}

async fn read_u8<R: AsyncRead + Unpin>(r: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)
        .await
        .map_err(|_| Error::UnexpectedEof)?;
    Ok(buf[0])
}

/// Fail with [`Error::ProtocolViolation`] if there is any byte left to read
/// before end-of-stream.
async fn assert_eos<R: AsyncRead + Unpin>(r: &mut R) -> Result<()> {
    let mut probe = [0u8; 1];
    match r.read(&mut probe).await {
        Ok(0) => Ok(()),
        Ok(_) => Err(Error::ProtocolViolation(
            "trailing bytes after put trailer".to_string(),
        )),
        Err(e) => Err(Error::Io(e)),
    }
}
