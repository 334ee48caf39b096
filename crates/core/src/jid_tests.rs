// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn dir(alias: &str) -> DnbEntry {
    DnbEntry {
        alias: DirAlias::new(alias),
        path: format!("/data/{alias}"),
        job_count: 0,
    }
}

fn job(id: u32, dir_alias: &str) -> JidEntry {
    JidEntry {
        job_id: JobId::new(id),
        dir_alias: DirAlias::new(dir_alias),
        host_alias: HostAlias::new("mirror01"),
        priority: 5,
        recipient_url: "ftp://mirror01/incoming".to_string(),
        no_of_loptions: 0,
        no_of_soptions: 0,
        soptions: String::new(),
    }
}

#[test]
fn recreate_message_renders_destination_and_options() {
    let mut j = job(7, "inbox");
    j.soptions = "archive 3600\nage-limit 60".to_string();
    let rendered = j.recreate_message();
    assert_eq!(
        rendered,
        "[destination]\nrecipient ftp://mirror01/incoming\n[options]\narchive 3600\nage-limit 60\n"
    );
}

#[test]
fn recreate_message_omits_options_section_when_empty() {
    let j = job(8, "inbox");
    assert_eq!(
        j.recreate_message(),
        "[destination]\nrecipient ftp://mirror01/incoming\n"
    );
}

#[test]
fn inserting_job_bumps_dir_count() {
    let mut table = JidTable::new();
    table.insert_dir(dir("inbox"));
    table.insert_job(job(1, "inbox"));
    assert_eq!(table.dir(&DirAlias::new("inbox")).unwrap().job_count, 1);
}

#[test]
fn removing_job_decrements_dir_count_and_returns_entry() {
    let mut table = JidTable::new();
    table.insert_dir(dir("inbox"));
    table.insert_job(job(1, "inbox"));
    let removed = table.remove_job(JobId::new(1)).unwrap();
    assert_eq!(removed.job_id, JobId::new(1));
    assert_eq!(table.dir(&DirAlias::new("inbox")).unwrap().job_count, 0);
    assert!(table.job(JobId::new(1)).is_none());
}

#[test]
fn orphaned_dirs_reports_zero_count_dirs_only() {
    let mut table = JidTable::new();
    table.insert_dir(dir("inbox"));
    table.insert_dir(dir("outbox"));
    table.insert_job(job(1, "inbox"));
    let orphans: Vec<_> = table.orphaned_dirs().map(|d| d.alias.clone()).collect();
    assert_eq!(orphans, vec![DirAlias::new("outbox")]);
}
