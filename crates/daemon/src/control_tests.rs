use super::*;

#[test]
fn command_code_round_trips() {
    for code in [
        CommandCode::Shutdown,
        CommandCode::IsAlive,
        CommandCode::QuickStop,
        CommandCode::SaveStop,
        CommandCode::DeleteJobs,
        CommandCode::CheckDir,
    ] {
        assert_eq!(CommandCode::from_byte(code.byte()), Ok(code));
    }
}

#[test]
fn unknown_command_byte_is_an_error() {
    assert_eq!(
        CommandCode::from_byte(b'?'),
        Err(ControlError::UnknownCommand(b'?'))
    );
}

#[test]
fn response_code_round_trips() {
    assert_eq!(ResponseCode::from_byte(ResponseCode::Ackn.byte()), Some(ResponseCode::Ackn));
    assert_eq!(ResponseCode::from_byte(ResponseCode::ProcTerm.byte()), Some(ResponseCode::ProcTerm));
    assert_eq!(ResponseCode::from_byte(b'z'), None);
}

#[test]
fn msg_announcement_round_trips() {
    let msg = MsgAnnouncement {
        creation_time: 1_700_000_000,
        job_id: 42,
        unique_number: 7,
        priority: b'I',
    };
    let bytes = msg.to_bytes();
    assert_eq!(bytes.len(), MSG_ANNOUNCEMENT_LEN);
    assert_eq!(MsgAnnouncement::from_bytes(&bytes), Ok(msg));
}

#[test]
fn msg_announcement_rejects_short_buffer() {
    assert!(MsgAnnouncement::from_bytes(&[0u8; 3]).is_err());
}

#[test]
fn pid_round_trips() {
    let encoded = encode_pid(1234);
    assert_eq!(decode_pid(&encoded), Ok(1234));
}

#[test]
fn retry_index_round_trips() {
    let encoded = encode_retry_index(99);
    assert_eq!(decode_retry_index(&encoded), Ok(99));
}

#[test]
fn delete_jobs_round_trips() {
    let ids = vec![1, 2, 3, 42];
    let encoded = encode_delete_jobs(&ids);
    assert_eq!(decode_delete_jobs(&encoded), Ok(ids));
}

#[test]
fn delete_jobs_empty_list_round_trips() {
    let encoded = encode_delete_jobs(&[]);
    assert_eq!(decode_delete_jobs(&encoded), Ok(Vec::new()));
}

#[test]
fn delete_jobs_rejects_truncated_payload() {
    let mut encoded = encode_delete_jobs(&[1, 2]);
    encoded.truncate(encoded.len() - 1);
    assert!(decode_delete_jobs(&encoded).is_err());
}
