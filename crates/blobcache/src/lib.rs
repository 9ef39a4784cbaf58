//! The process-wide blob cache facade.
//!
//! A process runs exactly one active [`blobcache_role::Role`] at a time —
//! either a [`blobcache_role::ServerRole`] or a [`blobcache_role::ProxyRole`]
//! — reached through module-level functions instead of an object callers
//! thread through their own code: a single `OnceLock`-guarded cell holding
//! the active role, with a `tokio::sync::Mutex` inside it since init and
//! shutdown must themselves be async.
//!
//! Re-initialization is treated as an error rather than a silent no-op: a
//! second `init_*` call before `shutdown` returns
//! [`Error::AlreadyInitialized`] instead of quietly replacing (and leaking
//! the listener of) the first role.

use std::net::SocketAddr;
use std::sync::OnceLock;

use tokio::io::AsyncRead;
use tokio::sync::Mutex;

use blobcache_core::{BlobCacheConfig, BlobKey, Error, JobId, Result};
use blobcache_role::{ProxyRole, Role, ServerRole};
use blobcache_store::FileStore;

static CELL: OnceLock<Mutex<Option<Role>>> = OnceLock::new();

fn cell() -> &'static Mutex<Option<Role>> {
    CELL.get_or_init(|| Mutex::new(None))
}

/// Initialize the process as a `Server`, bound to `addr` and backed by a
/// [`FileStore`] under `config`'s resolved storage directory. Returns the
/// address actually bound (useful when `addr`'s port is 0).
///
/// Fails with [`Error::AlreadyInitialized`] if a role is already active.
pub async fn init_server(addr: SocketAddr, config: &BlobCacheConfig) -> Result<SocketAddr> {
    let mut guard = cell().lock().await;
    if guard.is_some() {
        return Err(Error::AlreadyInitialized);
    }

    let root = blobcache_store::storage_dir_path(&config.storage_base());
    let store = std::sync::Arc::new(FileStore::open(root).await?);
    let role = ServerRole::bind(addr, store).await?;
    let bound = role.local_addr();
    role.start();

    tracing::info!(addr = %bound, "blobcache facade initialized as server");
    *guard = Some(Role::Server(role));
    Ok(bound)
}

/// Initialize the process as a `Proxy`, reading through to `server_addr` and
/// caching locally under `config`'s resolved storage directory.
///
/// Fails with [`Error::AlreadyInitialized`] if a role is already active.
pub async fn init_proxy(server_addr: SocketAddr, config: &BlobCacheConfig) -> Result<()> {
    let mut guard = cell().lock().await;
    if guard.is_some() {
        return Err(Error::AlreadyInitialized);
    }

    let root = blobcache_store::storage_dir_path(&config.storage_base());
    let store = std::sync::Arc::new(FileStore::open(root).await?);
    tracing::info!(%server_addr, "blobcache facade initialized as proxy");
    *guard = Some(Role::Proxy(ProxyRole::new(server_addr, store)));
    Ok(())
}

/// Store a byte slice through the active role.
pub async fn put_bytes(bytes: &[u8], job_id: Option<&JobId>) -> Result<BlobKey> {
    let guard = cell().lock().await;
    match guard.as_ref() {
        Some(role) => role.put_bytes(bytes, job_id).await,
        None => Err(Error::NotInitialized),
    }
}

/// Store an arbitrary byte stream through the active role.
pub async fn put_stream<R: AsyncRead + Unpin>(
    reader: &mut R,
    job_id: Option<&JobId>,
) -> Result<BlobKey> {
    let guard = cell().lock().await;
    match guard.as_ref() {
        Some(role) => role.put_stream(reader, job_id).await,
        None => Err(Error::NotInitialized),
    }
}

/// Open the blob for `key` through the active role.
pub async fn get(key: &BlobKey) -> Result<tokio::fs::File> {
    let guard = cell().lock().await;
    match guard.as_ref() {
        Some(role) => role.get(key).await,
        None => Err(Error::NotInitialized),
    }
}

/// A `file://` URL for `key` through the active role.
pub async fn get_url(key: &BlobKey) -> Result<String> {
    let guard = cell().lock().await;
    match guard.as_ref() {
        Some(role) => role.get_url(key).await,
        None => Err(Error::NotInitialized),
    }
}

/// Tear down the active role and clear the facade, so a subsequent
/// `init_server`/`init_proxy` call may succeed again.
pub async fn shutdown() -> Result<()> {
    let mut guard = cell().lock().await;
    match guard.take() {
        Some(role) => role.shutdown().await,
        None => Err(Error::NotInitialized),
    }
}
