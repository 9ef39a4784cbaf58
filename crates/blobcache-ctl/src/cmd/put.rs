//! `blobcache-ctl put` — send a file to a running `blobcached` server.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};

pub async fn cmd_put(addr: SocketAddr, path: &Path) -> Result<()> {
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("opening {}", path.display()))?;

    let key = blobcache_role::client::put_stream(addr, &mut file, None)
        .await
        .context("put failed")?;

    println!("{}", key.to_hex());
    Ok(())
}
