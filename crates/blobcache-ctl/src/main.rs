//! blobcache-ctl — command-line interface for a running `blobcached`.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

mod cmd;

const DEFAULT_ADDR: &str = "127.0.0.1:9300";

fn print_usage() {
    println!("Usage: blobcache-ctl [--addr <addr>] <command>");
    println!();
    println!("  put <path>                 Put a file, printing its blob key");
    println!("  get <key> -o <path>        Fetch a blob by hex key to a file");
    println!("  status <dir>               Show blob count/bytes in a storage directory");
    println!();
    println!(
        "Options:\n  --addr <addr>   Server address for put/get (default: {})",
        DEFAULT_ADDR
    );
    println!();
    println!("Examples:");
    println!("  blobcache-ctl put artifact.jar");
    println!("  blobcache-ctl --addr 10.0.0.5:9300 get 7037807198c22a7d2b0807371d763779a84fdfcf -o artifact.jar");
    println!("  blobcache-ctl status /var/lib/blobcache/blob-jobuser-4321");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut addr: SocketAddr = DEFAULT_ADDR.parse().unwrap();
    let mut remaining: Vec<String> = Vec::new();
    let mut out: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" => {
                i += 1;
                addr = args
                    .get(i)
                    .context("--addr requires a value")?
                    .parse()
                    .context("--addr must be host:port")?;
            }
            "-o" | "--out" => {
                i += 1;
                out = Some(PathBuf::from(
                    args.get(i).context("-o requires a value")?,
                ));
            }
            other => remaining.push(other.to_string()),
        }
        i += 1;
    }

    let remaining_refs: Vec<&str> = remaining.iter().map(|s| s.as_str()).collect();
    match remaining_refs.as_slice() {
        ["put", path] => cmd::put::cmd_put(addr, &PathBuf::from(path)).await,
        ["get", key] => {
            let out = out.context("get requires -o <path>")?;
            cmd::get::cmd_get(addr, key, &out).await
        }
        ["status", dir] => cmd::status::cmd_status(&PathBuf::from(dir)).await,
        ["help"] | ["--help"] | ["-h"] | [] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
