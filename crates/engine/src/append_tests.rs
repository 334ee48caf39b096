// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn write_message(dir: &Path, job_id: u32, body: &str) -> PathBuf {
    let messages = dir.join("messages");
    std::fs::create_dir_all(&messages).unwrap();
    let path = messages.join(job_id.to_string());
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn record_adds_restart_line_to_fresh_message() {
    let dir = tempfile::tempdir().unwrap();
    let engine = AppendEngine::new(dir.path().to_path_buf());
    write_message(
        dir.path(),
        1,
        "[destination]\nrecipient ftp://host/path\n",
    );

    engine.record(1, "big.bin").unwrap();

    let contents = std::fs::read_to_string(engine.message_path(1)).unwrap();
    assert!(contents.contains("restart big.bin"));
}

#[test]
fn record_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let engine = AppendEngine::new(dir.path().to_path_buf());
    write_message(dir.path(), 1, "[destination]\nrecipient ftp://host/path\n");

    engine.record(1, "big.bin").unwrap();
    engine.record(1, "big.bin").unwrap();

    let contents = std::fs::read_to_string(engine.message_path(1)).unwrap();
    assert_eq!(contents.matches("big.bin").count(), 1);
}

#[test]
fn resolve_removes_one_filename_and_keeps_others() {
    let dir = tempfile::tempdir().unwrap();
    let engine = AppendEngine::new(dir.path().to_path_buf());
    write_message(dir.path(), 1, "[destination]\nrecipient ftp://host/path\n");
    engine.record(1, "a.bin").unwrap();
    engine.record(1, "b.bin").unwrap();

    engine.resolve(1, "a.bin").unwrap();

    let contents = std::fs::read_to_string(engine.message_path(1)).unwrap();
    assert!(!contents.contains("a.bin"));
    assert!(contents.contains("b.bin"));
}

#[test]
fn resolve_last_filename_drops_restart_option_entirely() {
    let dir = tempfile::tempdir().unwrap();
    let engine = AppendEngine::new(dir.path().to_path_buf());
    write_message(dir.path(), 1, "[destination]\nrecipient ftp://host/path\n");
    engine.record(1, "only.bin").unwrap();

    engine.resolve(1, "only.bin").unwrap();

    let contents = std::fs::read_to_string(engine.message_path(1)).unwrap();
    assert!(!contents.contains("restart"));
}

#[test]
fn resolve_all_clears_restart_list_in_one_call() {
    let dir = tempfile::tempdir().unwrap();
    let engine = AppendEngine::new(dir.path().to_path_buf());
    write_message(dir.path(), 1, "[destination]\nrecipient ftp://host/path\n");
    engine.record(1, "a.bin").unwrap();
    engine.record(1, "b.bin").unwrap();

    engine.resolve_all(1).unwrap();

    let contents = std::fs::read_to_string(engine.message_path(1)).unwrap();
    assert!(!contents.contains("restart"));
}

#[test]
fn record_then_resolve_is_a_no_op_on_the_file_set() {
    let dir = tempfile::tempdir().unwrap();
    let engine = AppendEngine::new(dir.path().to_path_buf());
    let path = write_message(dir.path(), 1, "[destination]\nrecipient ftp://host/path\n");
    let before = std::fs::read_to_string(&path).unwrap();

    engine.record(1, "f.bin").unwrap();
    engine.resolve(1, "f.bin").unwrap();

    let after = std::fs::read_to_string(&path).unwrap();
    assert_eq!(before, after);
}

#[test]
fn apply_append_op_reports_missing_destination_as_message_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_message(dir.path(), 1, "not a message\n");

    let result = apply_append_op(&path, AppendOp::Record, "f.bin");

    assert!(matches!(result, Err(AppendError::Message(_))));
}
