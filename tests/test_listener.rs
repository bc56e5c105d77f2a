//! End-to-end tests over real TCP connections

use std::path::Path;
use std::time::Duration;

use byfrost::config::Config;
use byfrost::protocol::frame::FileFrame;
use byfrost::server::listener;
use byfrost::storage::DiskStore;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

/// Polls until `path` exists with `len` bytes or the deadline passes.
async fn wait_for_file(path: &Path, len: u64) -> bool {
    for _ in 0..100 {
        if let Ok(meta) = tokio::fs::metadata(path).await {
            if meta.len() == len {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_upload_over_tcp() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DiskStore::open(tmp.path()).await.unwrap();
    let listener = listener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(listener::serve(listener, store, shutdown.clone()));

    let mut client = TcpStream::connect(addr).await.unwrap();
    let mut bytes = FileFrame::new("a.txt", &b"abcd"[..]).encode().unwrap().to_vec();
    bytes.extend_from_slice(&FileFrame::new("b.txt", &b"efgh!"[..]).encode().unwrap());
    client.write_all(&bytes).await.unwrap();

    assert!(wait_for_file(&tmp.path().join("a.txt"), 4).await);
    assert!(wait_for_file(&tmp.path().join("b.txt"), 5).await);
    assert_eq!(std::fs::read(tmp.path().join("a.txt")).unwrap(), b"abcd");

    shutdown.cancel();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_invalid_header_closes_connection() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DiskStore::open(tmp.path()).await.unwrap();
    let listener = listener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(listener::serve(listener, store, shutdown.clone()));

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(&[0x00, 0x00, 0x01]).await.unwrap();

    // The server closes without replying.
    let mut buf = [0u8; 1];
    let n = tokio::time::timeout(Duration::from_secs(2), client.read(&mut buf))
        .await
        .unwrap()
        .unwrap_or(0);
    assert_eq!(n, 0);

    shutdown.cancel();
    server.await.unwrap().unwrap();
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_shutdown_keeps_accepted_connections() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DiskStore::open(tmp.path()).await.unwrap();
    let listener = listener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(listener::serve(listener, store, shutdown.clone()));

    let bytes = FileFrame::new("late.bin", vec![1u8; 32]).encode().unwrap();
    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(&bytes[..10]).await.unwrap();

    // Give the accept loop time to hand the socket to its worker.
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.cancel();
    server.await.unwrap().unwrap();

    assert!(TcpStream::connect(addr).await.is_err());

    client.write_all(&bytes[10..]).await.unwrap();
    assert!(wait_for_file(&tmp.path().join("late.bin"), 32).await);
}

#[tokio::test]
async fn test_run_with_config() {
    let tmp = tempfile::tempdir().unwrap();
    let output_dir = tmp.path().join("out");
    let mut cfg = Config::default();
    cfg.server.listen_addr = "127.0.0.1:0".to_string();
    cfg.storage.output_dir = output_dir.clone();

    let shutdown = CancellationToken::new();
    shutdown.cancel();

    listener::run(&cfg, shutdown).await.unwrap();
    assert!(output_dir.is_dir());
}
