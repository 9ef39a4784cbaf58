//! `blobcache-ctl status` — local storage-directory statistics.
//!
//! There is no status call in the wire protocol (only put and get are
//! defined), so this inspects a role's storage directory directly rather
//! than asking a running daemon over the network.

use std::path::Path;

use anyhow::{Context, Result};
use blobcache_store::FileStore;

pub async fn cmd_status(dir: &Path) -> Result<()> {
    let store = FileStore::open(dir.to_path_buf())
        .await
        .with_context(|| format!("opening storage directory {}", dir.display()))?;
    let (count, bytes) = store.stats().await?;

    println!("storage directory : {}", dir.display());
    println!("blobs              : {count}");
    println!("bytes              : {bytes}");
    Ok(())
}
