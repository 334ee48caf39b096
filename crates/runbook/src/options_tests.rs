// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_archive_and_age_limit() {
    assert_eq!(JobOption::parse_line("archive 3600"), Some(JobOption::Archive(3600)));
    assert_eq!(JobOption::parse_line("age-limit 60"), Some(JobOption::AgeLimit(60)));
}

#[test]
fn parses_lock_regimes() {
    assert_eq!(JobOption::parse_line("lock DOT"), Some(JobOption::Lock(LockRegime::Dot)));
    assert_eq!(
        JobOption::parse_line("lock DOT_VMS"),
        Some(JobOption::Lock(LockRegime::DotVms))
    );
    assert_eq!(
        JobOption::parse_line("lock LOCKFILE"),
        Some(JobOption::Lock(LockRegime::Lockfile))
    );
}

#[test]
fn parses_flag_only_attach_option() {
    assert_eq!(JobOption::parse_line("attach file"), Some(JobOption::AttachFile));
}

#[test]
fn parses_mode() {
    assert_eq!(
        JobOption::parse_line("mode passive"),
        Some(JobOption::Mode(TransferMode::Passive))
    );
    assert_eq!(
        JobOption::parse_line("mode active"),
        Some(JobOption::Mode(TransferMode::Active))
    );
}

#[test]
fn unrecognised_option_round_trips_verbatim() {
    let opt = JobOption::parse_line("site CHMOD 644").unwrap();
    assert_eq!(opt, JobOption::Site("CHMOD 644".to_string()));
    assert_eq!(opt.render_line(), "site CHMOD 644");
}

#[test]
fn unknown_option_name_preserved() {
    let opt = JobOption::parse_line("frobnicate yes").unwrap();
    assert_eq!(opt, JobOption::Unknown("frobnicate".to_string(), "yes".to_string()));
    assert_eq!(opt.render_line(), "frobnicate yes");
}

#[test]
fn blank_line_parses_to_none() {
    assert_eq!(JobOption::parse_line("   "), None);
}

#[test]
fn render_round_trips_for_every_variant() {
    let lines = [
        "archive 3600",
        "age-limit 60",
        "lock DOT",
        "trans_rename s/foo/bar/",
        "subject daily report",
        "attach file",
        "mode active",
        "chmod 644",
        "chown 1000:1000",
        "site CHMOD 600",
    ];
    for line in lines {
        let opt = JobOption::parse_line(line).unwrap();
        assert_eq!(opt.render_line(), line);
    }
}
