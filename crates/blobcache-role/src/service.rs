//! The `Role` dispatcher — a tagged union of [`ServerRole`] and
//! [`ProxyRole`]. A plain enum rather than a trait object: the two roles
//! never need to be swapped at anything finer than process granularity.

use blobcache_core::{BlobKey, JobId, Result};
use tokio::io::AsyncRead;

use crate::proxy::ProxyRole;
use crate::server::ServerRole;

/// The single active role a process runs the blob cache under.
pub enum Role {
    /// Authoritative store, reachable over the network.
    Server(ServerRole),
    /// Read-through cache in front of a `Server`.
    Proxy(ProxyRole),
}

impl Role {
    /// Store a byte slice, returning the key it verified.
    pub async fn put_bytes(&self, bytes: &[u8], job_id: Option<&JobId>) -> Result<BlobKey> {
        match self {
            Role::Server(role) => role.put_bytes(bytes, job_id).await,
            Role::Proxy(role) => role.put_bytes(bytes, job_id).await,
        }
    }

    /// Store an arbitrary byte stream, returning the key it verified.
    pub async fn put_stream<R: AsyncRead + Unpin>(
        &self,
        reader: &mut R,
        job_id: Option<&JobId>,
    ) -> Result<BlobKey> {
        match self {
            Role::Server(role) => role.put_stream(reader, job_id).await,
            Role::Proxy(role) => role.put_stream(reader, job_id).await,
        }
    }

    /// Open the blob for `key`. A proxy fetches-and-verifies on a local miss.
    pub async fn get(&self, key: &BlobKey) -> Result<tokio::fs::File> {
        match self {
            Role::Server(role) => role.get(key).await,
            Role::Proxy(role) => role.get(key).await,
        }
    }

    /// A `file://` URL for `key`, same read-through semantics as [`Role::get`].
    pub async fn get_url(&self, key: &BlobKey) -> Result<String> {
        match self {
            Role::Server(role) => role.get_url(key).await,
            Role::Proxy(role) => role.get_url(key).await,
        }
    }

    /// Tear down the role: stop accepting connections (server only) and wipe
    /// the local storage directory.
    pub async fn shutdown(&self) -> Result<()> {
        match self {
            Role::Server(role) => role.shutdown().await,
            Role::Proxy(role) => role.shutdown().await,
        }
    }
}
