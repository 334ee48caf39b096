use super::*;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader as TokioBufReader};
use tokio::net::{TcpListener, TcpStream};

async fn drive_server(listener: TcpListener, script: Vec<(&'static str, &'static str)>) {
    let (stream, _) = listener.accept().await.expect("accept");
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = TokioBufReader::new(read_half);
    write_half.write_all(b"220 ready\r\n").await.expect("banner");
    for (expect_prefix, reply) in script {
        let mut line = String::new();
        reader.read_line(&mut line).await.expect("read cmd");
        assert!(
            line.starts_with(expect_prefix),
            "expected {expect_prefix:?}, got {line:?}"
        );
        write_half.write_all(reply.as_bytes()).await.expect("reply");
    }
    let mut data = Vec::new();
    let _ = reader.read_to_end(&mut data).await;
}

#[tokio::test]
async fn connect_runs_user_pass_type_sequence() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = tokio::spawn(drive_server(
        listener,
        vec![
            ("USER", "331 need password\r\n"),
            ("PASS", "230 logged in\r\n"),
            ("TYPE I", "200 type set\r\n"),
            ("QUIT", "221 bye\r\n"),
        ],
    ));

    let mut adapter = FtpAdapter::new();
    let target = ConnectTarget {
        host: addr.ip().to_string(),
        port: Some(addr.port()),
        user: Some("afduser".to_string()),
        password: Some("secret".to_string()),
        passive_mode: true,
        transfer_type: None,
        connect_timeout: tokio::time::Duration::from_secs(2),
        transfer_timeout: tokio::time::Duration::from_secs(2),
    };

    adapter.connect(&target).await.expect("connect");
    adapter.close().await.expect("close");
    server.await.expect("server task");
}

#[test]
fn supports_burst_and_append() {
    let adapter = FtpAdapter::new();
    assert!(adapter.supports_burst());
    assert!(adapter.supports_append());
}
