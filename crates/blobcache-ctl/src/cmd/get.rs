//! `blobcache-ctl get` — fetch a blob from a running `blobcached` server.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use blobcache_core::BlobKey;

pub async fn cmd_get(addr: SocketAddr, key_hex: &str, out: &Path) -> Result<()> {
    let key: BlobKey = key_hex
        .parse()
        .with_context(|| format!("invalid blob key {key_hex:?}"))?;

    let mut stream = blobcache_role::client::get(addr, &key).await.context("get failed")?;
    let mut out_file = tokio::fs::File::create(out)
        .await
        .with_context(|| format!("creating {}", out.display()))?;

    tokio::io::copy(&mut stream, &mut out_file)
        .await
        .context("streaming blob to output file")?;

    println!("wrote {} to {}", key.to_hex(), out.display());
    Ok(())
}
