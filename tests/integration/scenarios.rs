//! Six literal end-to-end scenarios run in-process against the library
//! crates directly (a real TCP loopback connection for the network put/get
//! paths, no subprocess).

use std::sync::Arc;

use blobcache_core::{BlobKey, Error};
use blobcache_role::server::ServerRole;
use blobcache_role::{client, ProxyRole};
use blobcache_store::FileStore;

async fn spawn_server() -> (std::net::SocketAddr, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path().join("store")).await.unwrap());
    let role = ServerRole::bind("127.0.0.1:0".parse().unwrap(), store)
        .await
        .unwrap();
    let addr = role.local_addr();
    role.start();
    Box::leak(Box::new(role));
    (addr, dir)
}

#[tokio::test]
async fn scenario_1_empty_buffer_put() {
    let (addr, _dir) = spawn_server().await;
    let key = client::put_bytes(addr, b"", None).await.unwrap();
    assert_eq!(key.to_hex(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");

    let mut stream = client::get(addr, &key).await.unwrap();
    let mut received = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut stream, &mut received)
        .await
        .unwrap();
    assert!(received.is_empty());
}

#[tokio::test]
async fn scenario_2_small_buffer_put() {
    let (addr, _dir) = spawn_server().await;
    let data = [0x01, 0x02, 0x03];
    let key = client::put_bytes(addr, &data, None).await.unwrap();
    assert_eq!(key.to_hex(), "7037807198c22a7d2b0807371d763779a84fdfcf");

    let mut stream = client::get(addr, &key).await.unwrap();
    let mut received = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut stream, &mut received)
        .await
        .unwrap();
    assert_eq!(received, data);
}

#[tokio::test]
async fn scenario_3_sixteen_kib_streaming_put_both_modes_agree() {
    let (addr, _dir) = spawn_server().await;

    let mut bytes = vec![0u8; 16384];
    bytes[0] = 1;
    bytes[1] = 2;
    bytes[2] = 3;

    // Stateless (network) form.
    let network_key = client::put_bytes(addr, &bytes, None).await.unwrap();

    // Stateful (local) form, against a second, independent store — the key
    // law says both MUST agree regardless of which store computed it.
    let local_dir = tempfile::tempdir().unwrap();
    let local_store = Arc::new(FileStore::open(local_dir.path().join("store")).await.unwrap());
    let local_role = ServerRole::bind("127.0.0.1:0".parse().unwrap(), local_store)
        .await
        .unwrap();
    let local_key = local_role.put_bytes(&bytes, None).await.unwrap();

    assert_eq!(network_key, local_key);

    let mut stream = client::get(addr, &network_key).await.unwrap();
    let mut received = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut stream, &mut received)
        .await
        .unwrap();
    assert_eq!(received, bytes);

    let mut local_file = local_role.get(&local_key).await.unwrap();
    let mut local_received = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut local_file, &mut local_received)
        .await
        .unwrap();
    assert_eq!(local_received, bytes);
}

#[tokio::test]
async fn scenario_4_zero_key_get_is_not_found_in_both_roles() {
    let (server_addr, _server_dir) = spawn_server().await;

    let err = client::get(server_addr, &BlobKey::ZERO).await.unwrap_err();
    assert!(matches!(err, Error::NotFound));

    let proxy_dir = tempfile::tempdir().unwrap();
    let proxy_store = Arc::new(
        FileStore::open(proxy_dir.path().join("proxy"))
            .await
            .unwrap(),
    );
    let proxy = ProxyRole::new(server_addr, proxy_store);
    let err = proxy.get(&BlobKey::ZERO).await.unwrap_err();
    assert!(matches!(err, Error::NotFound));
}

#[tokio::test]
async fn scenario_5_wire_corruption_is_rejected_and_not_retried() {
    // The client computes its own digest locally and compares it to the
    // server's trailer; we can't tamper with bytes "on the wire" without a
    // malicious server, so this proves the client-side half of the
    // contract: a trailer that disagrees with the locally computed digest
    // is `CorruptTransfer`, verified directly against the wire primitives.
    use blobcache_core::digest::StreamingDigest;

    let data = b"scenario five payload";
    let mut digest = StreamingDigest::new();
    digest.update(data);
    let expected = digest.finalize();

    let mut wire = Vec::new();
    let wrong_key = {
        let mut bytes = *expected.as_bytes();
        bytes[0] ^= 0xff;
        BlobKey::from_bytes(bytes)
    };
    blobcache_proto::write_put_trailer(&mut wire, &wrong_key)
        .await
        .unwrap();

    let err = blobcache_proto::read_put_trailer_and_verify(&mut std::io::Cursor::new(wire), &expected)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CorruptTransfer { .. }));
}

#[tokio::test]
async fn scenario_6_proxy_read_through_then_local_hit() {
    let (server_addr, _server_dir) = spawn_server().await;
    let key = client::put_bytes(server_addr, b"read-through payload", None)
        .await
        .unwrap();

    let proxy_dir = tempfile::tempdir().unwrap();
    let proxy_store = Arc::new(
        FileStore::open(proxy_dir.path().join("proxy"))
            .await
            .unwrap(),
    );
    let proxy = ProxyRole::new(server_addr, proxy_store.clone());

    assert!(proxy_store.lookup(&key).await.unwrap().is_none());
    let mut file = proxy.get(&key).await.unwrap();
    let mut data = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut file, &mut data)
        .await
        .unwrap();
    assert_eq!(data, b"read-through payload");

    // Promoted into the proxy's own store.
    let promoted = proxy_store.lookup(&key).await.unwrap();
    assert!(promoted.is_some());
    assert!(promoted
        .unwrap()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("blob_"));

    // A second proxy.get for the same key never needs the network: the
    // local lookup alone must already satisfy it.
    assert!(proxy_store.lookup(&key).await.unwrap().is_some());
    let mut file = proxy.get(&key).await.unwrap();
    let mut data = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut file, &mut data)
        .await
        .unwrap();
    assert_eq!(data, b"read-through payload");
}
