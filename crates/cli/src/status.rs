// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `afd-ctl status`: a read-only snapshot of host/queue state (spec §3),
//! plus an optional `--follow` tail of the ambient event log — the
//! `afdd`-like query surface SPEC_FULL.md names alongside the control
//! commands ("afd-cli status --follow").
//!
//! This reads the same on-disk arenas and WAL the running `afd` daemon
//! owns, but never takes the daemon's exclusive work-dir lock: it is a
//! query, not a participant, and must work even while the daemon is up.

use std::path::Path;
use std::time::Duration;

use afd_core::event::Event;
use afd_daemon::lifecycle::arenas::Arenas;
use afd_daemon::Config;
use afd_engine::tables::SharedTables;
use afd_storage::{load_snapshot, Wal};
use anyhow::{Context, Result};

use crate::color;
use crate::table::{Column, Table};

pub async fn run(work_dir: &Path, follow: bool) -> Result<()> {
    let config = Config::at(work_dir.to_path_buf());

    let tables = SharedTables::new();
    let arenas = Arenas::open(&config.arena_dir).context("opening shared-state arenas")?;
    arenas
        .load_into(&tables)
        .context("loading shared-state arenas")?;

    print_hosts(&tables);
    print_totals(&config.snapshot_path)?;

    if follow {
        tail_events(&config.wal_path).await?;
    }

    Ok(())
}

fn print_hosts(tables: &SharedTables) {
    let mut aliases = tables.host_aliases();
    aliases.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    let mut table = Table::new(vec![
        Column::left("HOST"),
        Column::status("STATUS"),
        Column::right("ACTIVE"),
        Column::right("QUEUED"),
        Column::right("ERRORS"),
    ]);

    for alias in &aliases {
        let Some(host) = tables.host_snapshot(alias) else {
            continue;
        };
        let queued = tables
            .queue_entries_for_host(alias)
            .into_iter()
            .filter(|q| !q.is_removed())
            .count();
        let status = if host.status.contains(afd_core::host::HostStatus::DISABLED) {
            "disabled".to_string()
        } else if host
            .status
            .contains(afd_core::host::HostStatus::AUTO_PAUSE_QUEUE_STAT)
        {
            "stopped".to_string()
        } else {
            "running".to_string()
        };
        table.row(vec![
            host.alias.to_string(),
            status,
            format!("{}/{}", host.active_transfers, host.allowed_transfers),
            queued.to_string(),
            host.error_counter.to_string(),
        ]);
    }

    if aliases.is_empty() {
        println!("{}", color::muted("(no hosts registered)"));
        return;
    }

    let mut out = std::io::stdout();
    table.render(&mut out);
}

fn print_totals(snapshot_path: &Path) -> Result<()> {
    let Some(snapshot) = load_snapshot(snapshot_path)? else {
        println!("{}", color::muted("(no ambient snapshot yet)"));
        return Ok(());
    };
    let state = snapshot.state;
    println!(
        "{} dispatched={} finished={} bytes={} archived={}",
        color::header("totals"),
        state.total_jobs_dispatched,
        state.total_jobs_finished,
        state.total_bytes_transferred,
        state.total_archived,
    );
    Ok(())
}

/// Polls `wal_path` for newly appended [`Event`]s and prints each as it
/// arrives, until interrupted, reading through [`Wal::entries_after`]
/// since the WAL is structured JSONL rather than free text.
async fn tail_events(wal_path: &Path) -> Result<()> {
    let wal = Wal::open(wal_path, 0).context("opening event log")?;
    let mut last_seq = 0u64;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let entries = wal.entries_after(last_seq).context("reading event log")?;
        for entry in entries {
            last_seq = last_seq.max(entry.seq);
            print_event(&entry.event);
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(500)) => {}
            _ = &mut ctrl_c => break,
        }
    }

    Ok(())
}

fn print_event(event: &Event) {
    match serde_json::to_string(event) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("{}", color::muted(&format!("(undisplayable event: {e})"))),
    }
}
