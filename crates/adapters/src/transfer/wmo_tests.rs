use super::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

async fn drive_server_with_ack(listener: TcpListener, expected_type: &'static [u8; 2]) {
    let (mut stream, _) = listener.accept().await.expect("accept");
    let mut length_field = [0u8; 8];
    stream.read_exact(&mut length_field).await.expect("length");
    let len: usize = std::str::from_utf8(&length_field)
        .expect("utf8")
        .parse()
        .expect("parse len");
    let mut type_field = [0u8; 2];
    stream.read_exact(&mut type_field).await.expect("type");
    assert_eq!(&type_field, expected_type);
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await.expect("payload");
    stream.write_all(ACK).await.expect("ack");
}

#[tokio::test]
async fn send_file_frames_length_and_type_and_waits_for_ack() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = tokio::spawn(drive_server_with_ack(listener, b"BI"));

    let mut adapter = WmoAdapter::new(MessageType::Bulletin);
    let target = ConnectTarget {
        host: addr.ip().to_string(),
        port: Some(addr.port()),
        user: None,
        password: None,
        passive_mode: false,
        transfer_type: None,
        connect_timeout: tokio::time::Duration::from_secs(2),
        transfer_timeout: tokio::time::Duration::from_secs(2),
    };
    adapter.connect(&target).await.expect("connect");

    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("bulletin.txt");
    std::fs::write(&path, b"SXUS40 KWBC 281200").expect("write file");

    let request = FileTransferRequest {
        local_path: path,
        remote_name: "bulletin.txt".to_string(),
        size: 19,
        resume_offset: 0,
    };
    let outcome = adapter
        .send_file(&request, &mut |_| {})
        .await
        .expect("send");
    assert_eq!(outcome.bytes_sent, 19);

    adapter.close().await.expect("close");
    server.await.expect("server task");
}

#[tokio::test]
async fn send_file_rejects_nak() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let mut buf = vec![0u8; 4096];
        let _ = stream.read(&mut buf).await;
        stream.write_all(NAK).await.expect("nak");
    });

    let mut adapter = WmoAdapter::new(MessageType::Announcement);
    let target = ConnectTarget {
        host: addr.ip().to_string(),
        port: Some(addr.port()),
        user: None,
        password: None,
        passive_mode: false,
        transfer_type: None,
        connect_timeout: tokio::time::Duration::from_secs(2),
        transfer_timeout: tokio::time::Duration::from_secs(2),
    };
    adapter.connect(&target).await.expect("connect");

    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("note.txt");
    std::fs::write(&path, b"x").expect("write file");
    let request = FileTransferRequest {
        local_path: path,
        remote_name: "note.txt".to_string(),
        size: 1,
        resume_offset: 0,
    };

    let result = adapter.send_file(&request, &mut |_| {}).await;
    assert!(result.is_err());
    server.await.expect("server task");
}

#[test]
fn supports_burst_and_append() {
    let adapter = WmoAdapter::new(MessageType::Facsimile);
    assert!(adapter.supports_burst());
    assert!(adapter.supports_append());
}
