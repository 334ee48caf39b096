use super::*;
use tempfile::tempdir;

#[test]
fn ensure_fifo_creates_a_real_fifo() {
    let dir = tempdir().unwrap();
    ensure_fifo(dir.path(), "test_fifo").unwrap();
    let meta = std::fs::metadata(dir.path().join("test_fifo")).unwrap();
    assert!(
        std::os::unix::fs::FileTypeExt::is_fifo(&meta.file_type()),
        "expected a fifo"
    );
}

#[test]
fn ensure_fifo_is_idempotent() {
    let dir = tempdir().unwrap();
    ensure_fifo(dir.path(), "test_fifo").unwrap();
    ensure_fifo(dir.path(), "test_fifo").unwrap();
}

#[test]
fn ensure_all_creates_every_control_fifo() {
    let dir = tempdir().unwrap();
    ensure_all(dir.path()).unwrap();
    for name in ALL_FIFOS {
        let meta = std::fs::metadata(dir.path().join(name)).unwrap();
        assert!(std::os::unix::fs::FileTypeExt::is_fifo(&meta.file_type()));
    }
}

#[tokio::test]
async fn open_rw_round_trips_bytes() {
    let dir = tempdir().unwrap();
    ensure_fifo(dir.path(), MSG_FIFO).unwrap();

    let mut writer = open_rw(dir.path(), MSG_FIFO).await.unwrap();
    let mut reader = open_rw(dir.path(), MSG_FIFO).await.unwrap();

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    writer.write_all(b"hello").await.unwrap();
    writer.flush().await.unwrap();

    let mut buf = [0u8; 5];
    reader.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"hello");
}
