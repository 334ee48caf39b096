// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fixed_codes_match_spec_values() {
    assert_eq!(ExitCode::TransferSuccess.code(), 0);
    assert_eq!(ExitCode::SyntaxError.code(), 60);
    assert_eq!(ExitCode::NoFilesToSend.code(), 61);
    assert_eq!(ExitCode::StillFilesToSend.code(), 62);
}

#[test]
fn from_code_is_total_inverse_of_code_for_known_values() {
    for code in [0u8, 1, 9, 17, 60, 61, 62] {
        let parsed = ExitCode::from_code(code).unwrap();
        assert_eq!(parsed.code(), code);
    }
}

#[test]
fn unknown_code_returns_none() {
    assert!(ExitCode::from_code(200).is_none());
    assert!(ExitCode::from_code(18).is_none());
}

#[test]
fn only_success_still_and_no_files_are_non_transport() {
    assert!(!ExitCode::TransferSuccess.is_transport_error());
    assert!(!ExitCode::StillFilesToSend.is_transport_error());
    assert!(!ExitCode::NoFilesToSend.is_transport_error());
    assert!(ExitCode::ConnectError.is_transport_error());
    assert!(ExitCode::GotKilled.is_transport_error());
    assert!(ExitCode::SyntaxError.is_transport_error());
}
