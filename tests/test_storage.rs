use byfrost::protocol::frame::FileFrame;
use byfrost::storage::{DiskStore, FileSink};

#[tokio::test]
async fn test_open_creates_missing_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("nested").join("output");

    let store = DiskStore::open(&dir).await.unwrap();

    assert!(dir.is_dir());
    assert_eq!(store.output_dir(), dir.as_path());
}

#[tokio::test]
async fn test_store_writes_file_contents() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DiskStore::open(tmp.path()).await.unwrap();

    let written = store
        .store(&FileFrame::new("a.txt", &b"abcd"[..]))
        .await
        .unwrap();

    assert_eq!(written, 4);
    assert_eq!(std::fs::read(tmp.path().join("a.txt")).unwrap(), b"abcd");
}

#[tokio::test]
async fn test_store_empty_file() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DiskStore::open(tmp.path()).await.unwrap();

    let written = store.store(&FileFrame::new("empty", Vec::new())).await.unwrap();

    assert_eq!(written, 0);
    assert_eq!(std::fs::metadata(tmp.path().join("empty")).unwrap().len(), 0);
}

#[tokio::test]
async fn test_store_overwrites_existing_file() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DiskStore::open(tmp.path()).await.unwrap();

    store.store(&FileFrame::new("f", &b"first version"[..])).await.unwrap();
    store.store(&FileFrame::new("f", &b"second"[..])).await.unwrap();

    assert_eq!(std::fs::read(tmp.path().join("f")).unwrap(), b"second");
}

#[tokio::test]
async fn test_store_into_missing_subdirectory_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DiskStore::open(tmp.path()).await.unwrap();

    let err = store
        .store(&FileFrame::new("missing/file.txt", &b"x"[..]))
        .await
        .unwrap_err();

    assert_eq!(err.path, tmp.path().join("missing/file.txt"));
    assert!(err.to_string().starts_with("failed to write"));
}

#[tokio::test]
async fn test_path_for_joins_output_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DiskStore::open(tmp.path()).await.unwrap();

    assert_eq!(store.path_for("x.bin"), tmp.path().join("x.bin"));
}
