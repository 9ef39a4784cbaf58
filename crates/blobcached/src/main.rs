//! blobcached — the blob cache daemon.
//!
//! Runs a single role (server or proxy) for the lifetime of the process,
//! shutting down cleanly on SIGINT/SIGTERM and wiping its storage directory
//! on the way out.

use std::net::SocketAddr;

use anyhow::{bail, Context, Result};
use blobcache_core::BlobCacheConfig;

fn print_usage() {
    println!("Usage: blobcached <server|proxy> [options]");
    println!();
    println!("  server [--addr <addr>]             Run as the authoritative store");
    println!("  proxy --server <addr> [--addr <addr>]   Run as a read-through cache");
    println!();
    println!("Options:");
    println!("  --addr <addr>     Address to bind (server) or advertise (proxy); default 0.0.0.0:<configured port>");
    println!("  --server <addr>   Required in proxy mode: the server to read through to");
    println!();
    println!("Config is read via BlobCacheConfig::load() (env vars, then config file, then defaults).");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = BlobCacheConfig::load().context("loading blobcache config")?;

    let mut role = None;
    let mut addr_override: Option<SocketAddr> = None;
    let mut server_override: Option<SocketAddr> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "server" | "proxy" if role.is_none() => role = Some(args[i].clone()),
            "--addr" => {
                i += 1;
                addr_override = Some(
                    args.get(i)
                        .context("--addr requires a value")?
                        .parse()
                        .context("--addr must be host:port")?,
                );
            }
            "--server" => {
                i += 1;
                server_override = Some(
                    args.get(i)
                        .context("--server requires a value")?
                        .parse()
                        .context("--server must be host:port")?,
                );
            }
            "help" | "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => bail!("unknown argument: {other}"),
        }
        i += 1;
    }

    let default_addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse().unwrap();
    let bind_addr = addr_override.unwrap_or(default_addr);

    match role.as_deref() {
        Some("server") => {
            let bound = blobcache::init_server(bind_addr, &config).await?;
            tracing::info!(addr = %bound, "blobcached running as server");
        }
        Some("proxy") => {
            let server_addr = server_override.context("proxy mode requires --server <addr>")?;
            blobcache::init_proxy(server_addr, &config).await?;
            tracing::info!(%server_addr, "blobcached running as proxy");
        }
        _ => {
            print_usage();
            bail!("missing role: specify `server` or `proxy`");
        }
    }

    wait_for_shutdown_signal().await;
    tracing::info!("blobcached shutting down");
    blobcache::shutdown().await?;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
