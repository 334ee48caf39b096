use super::*;

fn target() -> ConnectTarget {
    ConnectTarget {
        host: "fake-host".to_string(),
        port: None,
        user: None,
        password: None,
        passive_mode: false,
        transfer_type: None,
        connect_timeout: tokio::time::Duration::from_secs(1),
        transfer_timeout: tokio::time::Duration::from_secs(1),
    }
}

#[tokio::test]
async fn records_connect_send_close_calls() {
    let mut adapter = FakeTransferAdapter::new();
    adapter.connect(&target()).await.expect("connect");

    let request = FileTransferRequest {
        local_path: "/tmp/irrelevant".into(),
        remote_name: "out.dat".to_string(),
        size: 42,
        resume_offset: 0,
    };
    let mut seen = 0u64;
    let outcome = adapter
        .send_file(&request, &mut |n| seen += n)
        .await
        .expect("send");
    assert_eq!(outcome.bytes_sent, 42);
    assert_eq!(seen, 42);

    adapter.close().await.expect("close");

    let calls = adapter.calls();
    assert_eq!(calls.len(), 3);
    assert!(matches!(&calls[0], TransferCall::Connect { host } if host == "fake-host"));
    assert!(matches!(&calls[1], TransferCall::SendFile { remote_name, size } if remote_name == "out.dat" && *size == 42));
    assert!(matches!(&calls[2], TransferCall::Close));
}

#[tokio::test]
async fn send_file_before_connect_fails() {
    let mut adapter = FakeTransferAdapter::new();
    let request = FileTransferRequest {
        local_path: "/tmp/irrelevant".into(),
        remote_name: "out.dat".to_string(),
        size: 1,
        resume_offset: 0,
    };
    let result = adapter.send_file(&request, &mut |_| {}).await;
    assert!(matches!(result, Err(TransferError::Connect(_))));
}

#[tokio::test]
async fn set_connect_error_is_consumed_once() {
    let mut adapter = FakeTransferAdapter::new();
    adapter.set_connect_error(TransferError::Connect("refused".to_string()));

    let result = adapter.connect(&target()).await;
    assert!(result.is_err());

    let result = adapter.connect(&target()).await;
    assert!(result.is_ok());
}

#[test]
fn with_capabilities_reports_requested_flags() {
    let adapter = FakeTransferAdapter::with_capabilities(true, false);
    assert!(adapter.supports_burst());
    assert!(!adapter.supports_append());
}
