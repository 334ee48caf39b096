// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires a [`DispatchPlan`](afd_engine::DispatchPlan) to a concrete
//! transfer adapter and [`WorkerContext`](afd_engine::WorkerContext)
//! (spec §4.5/§4.6): rereads the job message file at dispatch time
//! (rather than caching it in the MDB) since `trans_rename` and other
//! per-job options may have changed since the job was queued.
//!
//! `Scheme::Map` has no adapter selected here: the MAP library itself is
//! an external collaborator out of scope for this repo (spec §1,
//! `afd-adapters::transfer::map`'s own doc comment), and this daemon
//! binary has no vendor `MapClient` to inject. A MAP job is reported as a
//! connect error rather than silently dropped, so the scheduler's normal
//! error-counter/auto-toggle handling still applies to it.

use afd_adapters::transfer::{FtpAdapter, LocAdapter, MessageType, SmtpAdapter, WmoAdapter};
use afd_adapters::{ConnectTarget, TransferAdapter, TransferError};
use afd_core::append::AppendList;
use afd_core::message::Scheme;
use afd_engine::{SharedTables, WorkerContext};
use afd_runbook::{JobMessage, JobOption, RecipientUrl, TransferMode};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_SMTP_FROM: &str = "afd@localhost";
const DEFAULT_SMTP_SUBJECT: &str = "AFD transfer";

#[derive(Debug, Error)]
pub enum DispatchSetupError {
    #[error("job {0} has no JID entry")]
    UnknownJob(u32),
    #[error("job {0} has no MDB entry")]
    UnknownMdb(u32),
    #[error("job {0} has no watched directory")]
    UnknownDir(u32),
    #[error("io error reading job {job_id}'s message file: {source}")]
    Io {
        job_id: u32,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Message(#[from] afd_runbook::MessageError),
    #[error(transparent)]
    Url(#[from] afd_runbook::UrlError),
    #[error("scheme {0:?} has no transfer adapter wired in this daemon")]
    UnsupportedScheme(Scheme),
}

/// Everything [`afd_engine::run_transfer_job`] needs for one dispatched
/// job, reconstructed fresh from the job's message file and JID row.
pub struct WorkerPlan {
    pub adapter: Box<dyn TransferAdapter>,
    pub target: ConnectTarget,
    pub spool_dir: PathBuf,
    pub age_limit_secs: Option<u64>,
    pub trans_rename: Option<String>,
    pub restart: AppendList,
}

impl WorkerPlan {
    pub fn context(&self) -> WorkerContext<'_> {
        WorkerContext {
            spool_dir: self.spool_dir.clone(),
            age_limit_secs: self.age_limit_secs,
            trans_rename: self.trans_rename.as_deref(),
            // DIR_CONFIG-level post-exec commands aren't modeled as a
            // config type in this workspace yet; `afd-engine::worker`
            // still honours one if a caller supplies it.
            post_exec: None,
            restart: &self.restart,
        }
    }
}

/// Builds a [`WorkerPlan`] for `job_id`, already dispatched into `slot`
/// of `host_alias`'s FSA entry.
pub fn build_worker_plan(
    tables: &SharedTables,
    messages_dir: &std::path::Path,
    job_id: u32,
) -> Result<WorkerPlan, DispatchSetupError> {
    let mdb = tables
        .mdb_entry(afd_core::message::JobId::new(job_id))
        .ok_or(DispatchSetupError::UnknownMdb(job_id))?;

    let jid_entry = tables
        .with_jid(|jid| jid.job(afd_core::message::JobId::new(job_id)).cloned())
        .ok_or(DispatchSetupError::UnknownJob(job_id))?;

    let spool_dir = tables
        .with_jid(|jid| jid.dir(&jid_entry.dir_alias).map(|d| d.path.clone()))
        .ok_or(DispatchSetupError::UnknownDir(job_id))?;

    let contents = std::fs::read_to_string(messages_dir.join(job_id.to_string())).map_err(|source| {
        DispatchSetupError::Io { job_id, source }
    })?;
    let message = JobMessage::parse(&contents)?;
    let url = RecipientUrl::parse(&message.recipient)?;

    let age_limit_secs = message.section.options.iter().find_map(|o| match o {
        JobOption::AgeLimit(secs) => Some(*secs),
        _ => None,
    });
    let trans_rename = message.section.options.iter().find_map(|o| match o {
        JobOption::TransRename(rule) => Some(rule.clone()),
        _ => None,
    });
    let subject = message.section.options.iter().find_map(|o| match o {
        JobOption::Subject(s) => Some(s.clone()),
        _ => None,
    });
    let passive = message
        .section
        .options
        .iter()
        .any(|o| matches!(o, JobOption::Mode(TransferMode::Passive)));

    let target = ConnectTarget {
        passive_mode: passive,
        ..ConnectTarget::from_recipient(&url, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TRANSFER_TIMEOUT)
    };

    let adapter: Box<dyn TransferAdapter> = match mdb.scheme {
        Scheme::Ftp => Box::new(FtpAdapter::new()),
        Scheme::Loc => Box::new(LocAdapter::new()),
        Scheme::Smtp => Box::new(SmtpAdapter::new(
            DEFAULT_SMTP_FROM,
            subject.unwrap_or_else(|| DEFAULT_SMTP_SUBJECT.to_string()),
        )),
        Scheme::Wmo => Box::new(WmoAdapter::new(MessageType::Bulletin)),
        Scheme::Map => return Err(DispatchSetupError::UnsupportedScheme(Scheme::Map)),
    };

    Ok(WorkerPlan {
        adapter,
        target,
        spool_dir: PathBuf::from(spool_dir),
        age_limit_secs,
        trans_rename,
        restart: message.section.restart,
    })
}

/// The [`afd_core::exit_code::ExitCode`] a job with no wired adapter is
/// reported under, so it flows through the normal error-counter path
/// rather than being dropped silently.
pub fn unsupported_scheme_error() -> TransferError {
    TransferError::Connect("no transfer adapter configured for this scheme".to_string())
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
