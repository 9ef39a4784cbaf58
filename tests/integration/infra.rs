//! Process helpers for the daemon-based tests: locate the built binaries,
//! spawn a `blobcached` server, and wait for its listener to come up.
//! Ordinary loopback TCP — no network-namespace plumbing needed.

use std::net::{SocketAddr, TcpStream};
use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::Duration;

pub fn blobcached_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("target/debug/blobcached")
}

pub fn blobcache_ctl_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("target/debug/blobcache-ctl")
}

pub fn binaries_available() -> bool {
    blobcached_path().exists() && blobcache_ctl_path().exists()
}

/// Spawn `blobcached server --addr <addr>` with its storage base pointed at
/// `storage_base` via `BLOBCACHE_DIRECTORY`.
pub fn spawn_server(addr: SocketAddr, storage_base: &std::path::Path) -> Child {
    Command::new(blobcached_path())
        .args(["server", "--addr", &addr.to_string()])
        .env("BLOBCACHE_DIRECTORY", storage_base)
        .spawn()
        .expect("spawn blobcached server")
}

/// Poll `addr` until a TCP connection succeeds or `max_attempts` is reached.
pub fn wait_for_port(addr: SocketAddr, max_attempts: u32) -> anyhow::Result<()> {
    for _ in 0..max_attempts {
        if TcpStream::connect(addr).is_ok() {
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    anyhow::bail!("timed out waiting for {addr} to accept connections")
}

pub fn ctl(args: &[&str]) -> anyhow::Result<String> {
    let output = Command::new(blobcache_ctl_path()).args(args).output()?;
    if !output.status.success() {
        anyhow::bail!(
            "blobcache-ctl {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
