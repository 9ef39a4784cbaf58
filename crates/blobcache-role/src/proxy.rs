//! `ProxyRole` — a read-through cache. Services local gets from its own
//! disk; on a miss, fetches from the configured server and verifies
//! integrity before caching. Puts are forwarded unconditionally.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncRead;

use blobcache_core::digest::StreamingDigest;
use blobcache_core::{BlobKey, Error, JobId, Result};
use blobcache_store::FileStore;

use crate::client;

/// The proxy role.
pub struct ProxyRole {
    server_addr: SocketAddr,
    store: Arc<FileStore>,
}

impl ProxyRole {
    /// Build a proxy that reads through to `server_addr`, caching in `store`.
    pub fn new(server_addr: SocketAddr, store: Arc<FileStore>) -> Self {
        Self { server_addr, store }
    }

    /// Forward a byte-slice put to the server.
    pub async fn put_bytes(&self, bytes: &[u8], job_id: Option<&JobId>) -> Result<BlobKey> {
        client::put_bytes(self.server_addr, bytes, job_id).await
    }

    /// Forward a streamed put to the server.
    pub async fn put_stream<R: AsyncRead + Unpin>(
        &self,
        reader: &mut R,
        job_id: Option<&JobId>,
    ) -> Result<BlobKey> {
        client::put_stream(self.server_addr, reader, job_id).await
    }

    /// Local-first get: a local hit returns immediately; a miss triggers a
    /// read-through fetch and retries the local lookup once.
    pub async fn get(&self, key: &BlobKey) -> Result<tokio::fs::File> {
        if let Some(path) = self.store.lookup(key).await? {
            return Ok(tokio::fs::File::open(path).await?);
        }

        self.fetch(key).await?;

        match self.store.lookup(key).await? {
            Some(path) => Ok(tokio::fs::File::open(path).await?),
            None => Err(Error::NotFound),
        }
    }

    /// `file://` URL, same local-first-then-fetch pattern as [`ProxyRole::get`].
    pub async fn get_url(&self, key: &BlobKey) -> Result<String> {
        if let Some(path) = self.store.lookup(key).await? {
            return Ok(format!("file://{}", path.display()));
        }

        self.fetch(key).await?;

        match self.store.lookup(key).await? {
            Some(path) => Ok(format!("file://{}", path.display())),
            None => Err(Error::NotFound),
        }
    }

    /// Fetch `key` from the server, verify its digest, and promote it into
    /// the local store. Concurrent fetches of the same key may each
    /// populate their own temp file and race to promote; the race is benign
    /// because the final name is a pure function of the verified content.
    async fn fetch(&self, key: &BlobKey) -> Result<()> {
        let mut remote = client::get(self.server_addr, key).await?;

        let mut temp = self.store.alloc_temp().await?;
        let mut digest = StreamingDigest::new();
        {
            let file = temp.file_mut();
            blobcache_proto::copy_verifying(&mut remote, file, &mut digest).await?;
            use tokio::io::AsyncWriteExt;
            file.flush().await?;
        }

        let computed = digest.finalize();
        if computed != *key {
            // temp dropped here, which removes it
            return Err(Error::CorruptTransfer {
                expected: key.to_hex(),
                computed: computed.to_hex(),
            });
        }

        self.store.promote(temp, key).await?;
        tracing::info!(key = %key, "proxy fetch cached blob");
        Ok(())
    }

    /// Wipe the local cache. The proxy never accepts inbound connections,
    /// so there is no listener to close.
    pub async fn shutdown(&self) -> Result<()> {
        self.store.wipe().await
    }
}
