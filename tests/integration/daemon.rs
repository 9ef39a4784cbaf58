//! Subprocess smoke test: run the real `blobcached` and `blobcache-ctl`
//! binaries against each other. Skipped if the binaries haven't been built
//! (`cargo build` before `cargo test --test integration`).

use crate::infra;

#[test]
fn ctl_put_then_get_round_trips_through_a_real_daemon() {
    if !infra::binaries_available() {
        eprintln!("SKIP: blobcached/blobcache-ctl not built, run `cargo build` first");
        return;
    }

    let storage_base = tempfile::tempdir().unwrap();
    let addr: std::net::SocketAddr = "127.0.0.1:19300".parse().unwrap();
    let mut child = infra::spawn_server(addr, storage_base.path());
    infra::wait_for_port(addr, 50).expect("blobcached never came up");

    let result = (|| -> anyhow::Result<()> {
        let work_dir = tempfile::tempdir()?;
        let input_path = work_dir.path().join("artifact.bin");
        std::fs::write(&input_path, b"payload shipped through a real daemon")?;

        let key = infra::ctl(&[
            "--addr",
            &addr.to_string(),
            "put",
            input_path.to_str().unwrap(),
        ])?;
        assert_eq!(key.len(), 40, "expected a 40-char hex key, got {key:?}");

        let output_path = work_dir.path().join("fetched.bin");
        infra::ctl(&[
            "--addr",
            &addr.to_string(),
            "get",
            &key,
            "-o",
            output_path.to_str().unwrap(),
        ])?;

        let fetched = std::fs::read(&output_path)?;
        assert_eq!(fetched, b"payload shipped through a real daemon");

        let status = infra::ctl(&[
            "status",
            storage_base
                .path()
                .join(blobcache_store::storage_dir_name())
                .to_str()
                .unwrap(),
        ])?;
        assert!(status.contains("blobs"));
        assert!(status.contains('1'), "expected one blob counted: {status}");

        Ok(())
    })();

    let _ = child.kill();
    let _ = child.wait();

    result.unwrap();
}

#[test]
fn ctl_get_of_unknown_key_fails() {
    if !infra::binaries_available() {
        eprintln!("SKIP: blobcached/blobcache-ctl not built, run `cargo build` first");
        return;
    }

    let storage_base = tempfile::tempdir().unwrap();
    let addr: std::net::SocketAddr = "127.0.0.1:19301".parse().unwrap();
    let mut child = infra::spawn_server(addr, storage_base.path());
    infra::wait_for_port(addr, 50).expect("blobcached never came up");

    let out_path = tempfile::tempdir().unwrap().path().join("out.bin");
    let result = infra::ctl(&[
        "--addr",
        &addr.to_string(),
        "get",
        &"0".repeat(40),
        "-o",
        out_path.to_str().unwrap(),
    ]);

    let _ = child.kill();
    let _ = child.wait();

    assert!(result.is_err(), "get of a never-put key should fail");
}
