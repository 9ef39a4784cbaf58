//! `ServerRole` — the authoritative store. Accepts local and network
//! put/get, persists blobs via its [`FileStore`].

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use blobcache_core::digest::StreamingDigest;
use blobcache_core::{BlobKey, Error, JobId, Result};
use blobcache_store::FileStore;

/// The server role: accept loop plus local put/get that bypass the socket
/// entirely.
pub struct ServerRole {
    store: Arc<FileStore>,
    local_addr: SocketAddr,
    accepting: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    listener: Mutex<Option<TcpListener>>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl ServerRole {
    /// Bind a listener at `addr` (use port 0 to let the OS pick) and build a
    /// server role backed by `store`. Does not start accepting yet — call
    /// [`ServerRole::start`].
    pub async fn bind(addr: SocketAddr, store: Arc<FileStore>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            store,
            local_addr,
            accepting: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            listener: Mutex::new(Some(listener)),
            accept_task: Mutex::new(None),
        })
    }

    /// The address actually bound (useful when `addr` requested port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Begin accepting connections. Each accepted connection is dispatched
    /// to its own task; handlers are independent of each other and of local
    /// put/get callers.
    pub fn start(&self) {
        let listener = match self.listener.try_lock().ok().and_then(|mut l| l.take()) {
            Some(l) => l,
            None => {
                tracing::warn!("ServerRole::start called twice, ignoring");
                return;
            }
        };
        self.accepting.store(true, Ordering::SeqCst);

        let store = self.store.clone();
        let accepting = self.accepting.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            tracing::info!(addr = %listener.local_addr().ok().map(|a| a.to_string()).unwrap_or_default(), "server role accepting connections");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        tracing::info!("server role accept loop shutting down");
                        return;
                    }
                    accepted = listener.accept() => {
                        match accepted {
                            Ok((stream, peer)) => {
                                let store = store.clone();
                                tokio::spawn(async move {
                                    if let Err(e) = handle_connection(store, stream).await {
                                        tracing::warn!(%peer, error = %e, "connection handler failed");
                                    }
                                });
                            }
                            Err(e) => {
                                if accepting.load(Ordering::SeqCst) {
                                    tracing::warn!(error = %e, "accept failed");
                                }
                            }
                        }
                    }
                }
            }
        });

        if let Ok(mut slot) = self.accept_task.try_lock() {
            *slot = Some(handle);
        }
    }

    /// Store `bytes`, bypassing the socket. `job_id` is accepted for
    /// provenance only (logged at debug, never indexed).
    pub async fn put_bytes(&self, bytes: &[u8], job_id: Option<&JobId>) -> Result<BlobKey> {
        self.put_stream(&mut std::io::Cursor::new(bytes), job_id).await
    }

    /// Store an arbitrary byte stream, bypassing the socket.
    pub async fn put_stream<R: AsyncRead + Unpin>(
        &self,
        reader: &mut R,
        job_id: Option<&JobId>,
    ) -> Result<BlobKey> {
        if let Some(id) = job_id {
            tracing::debug!(job_id = %id.to_hex(), "local put carries job id");
        }
        let mut temp = self.store.alloc_temp().await?;
        let mut digest = StreamingDigest::new();
        {
            let file = temp.file_mut();
            blobcache_proto::copy_verifying(reader, file, &mut digest).await?;
        }
        let key = digest.finalize();
        self.store.promote(temp, &key).await?;
        tracing::info!(key = %key, "local put stored");
        Ok(key)
    }

    /// Look up `key` locally; `NotFound` on a miss.
    pub async fn get(&self, key: &BlobKey) -> Result<tokio::fs::File> {
        match self.store.lookup(key).await? {
            Some(path) => Ok(tokio::fs::File::open(path).await?),
            None => Err(Error::NotFound),
        }
    }

    /// A `file://` URL to the local promoted blob.
    pub async fn get_url(&self, key: &BlobKey) -> Result<String> {
        match self.store.lookup(key).await? {
            Some(path) => Ok(format!("file://{}", path.display())),
            None => Err(Error::NotFound),
        }
    }

    /// Stop accepting, join the accept task, and wipe the storage
    /// directory. In-flight connection handlers are not individually
    /// joined — their disk writes are already committed before any
    /// client-visible acknowledgement.
    pub async fn shutdown(&self) -> Result<()> {
        self.accepting.store(false, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());

        let handle = self.accept_task.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        self.store.wipe().await
    }
}

async fn handle_connection(store: Arc<FileStore>, mut stream: TcpStream) -> Result<()> {
    let op = blobcache_proto::read_op(&mut stream).await?;
    match op {
        blobcache_proto::Op::Put => handle_put(&store, &mut stream).await,
        blobcache_proto::Op::Get => handle_get(&store, &mut stream).await,
    }
}

async fn handle_put(store: &FileStore, stream: &mut TcpStream) -> Result<()> {
    let job_id = blobcache_proto::read_jobid_frame(stream).await?;
    if let Some(id) = &job_id {
        tracing::debug!(job_id = %id.to_hex(), "network put carries job id");
    }

    let mut temp = store.alloc_temp().await?;
    let mut digest = StreamingDigest::new();
    {
        let file = temp.file_mut();
        // TODO: wrap this in a tokio::time::timeout once there's a policy
        // for what a stalled client should see (a dropped connection here
        // leaves its temp file for the next wipe rather than reporting
        // anything back).
        blobcache_proto::recv_put_payload(stream, file, &mut digest).await?;
        file.flush().await?;
    }

    let key = digest.finalize();
    store.promote(temp, &key).await?;
    tracing::info!(key = %key, "network put stored");

    blobcache_proto::write_put_trailer(stream, &key).await?;
    stream.shutdown().await?;
    Ok(())
}

async fn handle_get(store: &FileStore, stream: &mut TcpStream) -> Result<()> {
    let key = blobcache_proto::read_get_request(stream).await?;
    match store.lookup(&key).await? {
        None => {
            blobcache_proto::write_status(stream, false).await?;
            Ok(())
        }
        Some(path) => {
            blobcache_proto::write_status(stream, true).await?;
            let mut file = tokio::fs::File::open(path).await?;
            blobcache_proto::stream_to_eof(&mut file, stream).await?;
            tracing::info!(key = %key, "network get served");
            Ok(())
        }
    }
}
