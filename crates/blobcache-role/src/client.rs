//! Stateless client routines that drive the wire protocol against a remote
//! server. Usable from any process — the role layer built on top of these
//! (see [`crate::proxy::ProxyRole`]) is what gives them a local cache.

use std::net::SocketAddr;

use tokio::io::AsyncRead;
use tokio::net::TcpStream;

use blobcache_core::digest::StreamingDigest;
use blobcache_core::{BlobKey, Error, JobId, Result};

/// Put a byte slice to the server at `addr`, returning the key it verified.
pub async fn put_bytes(
    addr: SocketAddr,
    bytes: &[u8],
    job_id: Option<&JobId>,
) -> Result<BlobKey> {
    put_stream(addr, &mut std::io::Cursor::new(bytes), job_id).await
}

/// Put an arbitrary byte stream to the server at `addr`, returning the key
/// it verified.
pub async fn put_stream<R: AsyncRead + Unpin>(
    addr: SocketAddr,
    reader: &mut R,
    job_id: Option<&JobId>,
) -> Result<BlobKey> {
    let mut stream = TcpStream::connect(addr).await?;
    blobcache_proto::write_op(&mut stream, blobcache_proto::Op::Put).await?;
    blobcache_proto::write_jobid_frame(&mut stream, job_id).await?;

    let mut digest = StreamingDigest::new();
    blobcache_proto::send_put_payload(reader, &mut stream, &mut digest).await?;
    use tokio::io::AsyncWriteExt;
    stream.flush().await?;

    let computed = digest.finalize();
    blobcache_proto::read_put_trailer_and_verify(&mut stream, &computed).await?;
    Ok(computed)
}

/// Fetch a blob from the server at `addr`.
///
/// On a hit, returns a [`TcpStream`] positioned right after the status byte
/// — reading it to EOF yields exactly the blob's bytes, and dropping it
/// closes the underlying socket. On a miss, the socket is closed before
/// [`Error::NotFound`] is returned.
pub async fn get(addr: SocketAddr, key: &BlobKey) -> Result<TcpStream> {
    let mut stream = TcpStream::connect(addr).await?;
    blobcache_proto::write_op(&mut stream, blobcache_proto::Op::Get).await?;
    blobcache_proto::write_get_request(&mut stream, key).await?;

    match blobcache_proto::read_status(&mut stream).await {
        Ok(true) => Ok(stream),
        Ok(false) => {
            drop(stream);
            Err(Error::NotFound)
        }
        Err(e) => {
            drop(stream);
            Err(e)
        }
    }
}
