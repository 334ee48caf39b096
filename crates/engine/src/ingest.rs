// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job ingestion (spec §4.2 `get_job_data`): turns one `msg_fifo`
//! announcement into live MDB/QB rows.
//!
//! The JID row the AMG registered for this job-id at watch time is the
//! source of truth for where the job goes (`host_alias`, `dir_alias`);
//! the message file on disk is only reparsed here to recover the
//! recipient's scheme and any per-job options (age-limit, trans_rename).
//! A missing message file is recreated from the JID row rather than
//! treated as an error, mirroring the reconciler's own `recreate_msg`
//! path (spec §4.9) — the two differ only in when they run.

use crate::tables::SharedTables;
use afd_core::message::{JobId, MdbEntry};
use afd_core::queue::QueueEntry;
use afd_runbook::{msg_number, JobMessage, JobOption, MessageError, RecipientUrl, UrlError};
use afd_shell::enumerate_files;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("job {0} has no JID entry")]
    UnknownJob(JobId),
    #[error("job {0} message file missing and could not be recreated")]
    MessageUnrecoverable(JobId, #[source] std::io::Error),
    #[error("job {0} message file malformed, unlinked")]
    MalformedMessage(JobId, #[source] MessageError),
    #[error("job {0} recipient URL malformed, message unlinked")]
    MalformedUrl(JobId, #[source] UrlError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// What one ingest pass decided about `job_id`. `Discarded` is not an
/// error: the host alias the JID row names is not (yet, or any longer)
/// present in the FSA, so the job is silently dropped rather than queued
/// against nothing (spec §4.2 "host alias not in FSA: discard").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Queued,
    Discarded,
}

/// Reads the job message file for `job_id`, cross-references its JID
/// row, and materializes an [`MdbEntry`]/[`QueueEntry`] pair in `tables`.
/// `priority`/`creation_time`/`unique` come from the [`MsgAnnouncement`]
/// read off `msg_fifo` (`afd-daemon::control`) and feed the dispatch-order
/// key the same way they do in the on-disk message name (spec §4.3, §6).
pub fn ingest_job(
    tables: &SharedTables,
    messages_dir: &Path,
    job_id: JobId,
    priority: char,
    creation_time: u64,
    unique: u64,
    now_epoch_ms: u64,
) -> Result<IngestOutcome, IngestError> {
    let jid_entry = tables
        .with_jid(|jid| jid.job(job_id).cloned())
        .ok_or(IngestError::UnknownJob(job_id))?;

    let message_path = messages_dir.join(job_id.0.to_string());
    let contents = match std::fs::read_to_string(&message_path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let recreated = jid_entry.recreate_message();
            std::fs::write(&message_path, &recreated)
                .map_err(|e| IngestError::MessageUnrecoverable(job_id, e))?;
            recreated
        }
        Err(e) => return Err(IngestError::Io(e)),
    };

    let message = JobMessage::parse(&contents).map_err(|e| {
        let _ = std::fs::remove_file(&message_path);
        IngestError::MalformedMessage(job_id, e)
    })?;

    let url = RecipientUrl::parse(&message.recipient).map_err(|e| {
        let _ = std::fs::remove_file(&message_path);
        IngestError::MalformedUrl(job_id, e)
    })?;

    if tables.host_snapshot(&jid_entry.host_alias).is_none() {
        return Ok(IngestOutcome::Discarded);
    }

    let age_limit_secs = message.section.options.iter().find_map(|o| match o {
        JobOption::AgeLimit(secs) => Some(*secs),
        _ => None,
    });

    let dir_path = tables.with_jid(|jid| jid.dir(&jid_entry.dir_alias).map(|d| d.path.clone()));
    let (files_to_send, file_size_to_send) = match &dir_path {
        Some(path) => {
            let files = enumerate_files(Path::new(path))?;
            (files.len() as u32, files.iter().map(|f| f.size).sum())
        }
        None => (0, 0),
    };

    let mtime_ms = std::fs::metadata(&message_path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(now_epoch_ms);

    tables.insert_mdb(MdbEntry {
        job_id,
        host_alias: jid_entry.host_alias.clone(),
        fsa_pos: 0,
        scheme: url.scheme,
        age_limit_secs,
        message_mtime_epoch_ms: mtime_ms,
        last_transfer_time_epoch_ms: None,
        in_current_fsa: true,
    });

    tables.insert_queue_entry(QueueEntry::new_pending(
        job_id,
        msg_number(priority, creation_time, unique),
        files_to_send,
        file_size_to_send,
    ));

    Ok(IngestOutcome::Queued)
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
