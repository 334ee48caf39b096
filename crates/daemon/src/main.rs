// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `afd` — the File Distributor daemon binary.
//!
//! Single long-lived process owning the control-plane fifos (spec
//! §4.4), the scheduler/supervisor event loop (spec §4.5), and the
//! background reconciler sweep (spec §4.9). Per the Design Notes'
//! rearchitecture (spec §9, `SPEC_FULL.md` §1), the original fork-per-
//! worker model becomes one spawned `tokio` task per dispatched job;
//! each fifo reader is its own task forwarding decoded frames into the
//! supervisor's `select!` loop over an `mpsc` channel, since a raw fifo
//! fd can't share a `select!` arm with a channel receiver directly.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use afd_core::event::Event;
use afd_core::exit_code::ExitCode;
use afd_core::host::HostAlias;
use afd_core::message::JobId;
use afd_daemon::control::{self, CommandCode, MsgAnnouncement, ResponseCode, MSG_ANNOUNCEMENT_LEN};
use afd_daemon::fifos::{self, DELETE_JOBS_FIFO, FD_CMD_FIFO, FD_RESP_FIFO, MSG_FIFO};
use afd_daemon::lifecycle::{self, reconcile_once, Config, Daemon, LifecycleError, StartupResult};
use afd_engine::tables::SharedTables;
use afd_engine::{apply_outcome, dispatch_ready, WorkerResult};

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;
const MAX_ROTATED_LOGS: u32 = 3;
const MAX_DIRS_PER_RECONCILE_PASS: usize = 4096;
/// Idle ceiling before a stale MDB entry is removed, absent a
/// `MAX_OUTPUT_LOG_FILES`/rotation-interval config knob in this
/// workspace (spec §3 "within MAX_OUTPUT_LOG_FILES × rotation
/// interval"): 7 days.
const MAX_IDLE_MS_BEFORE_REMOVAL: u64 = 7 * 24 * 3_600_000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("afd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: afd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    rotate_log_if_needed(&config.log_path);
    let log_guard = setup_logging(&config)?;

    info!("starting File Distributor");

    let StartupResult {
        mut daemon,
        mut event_reader,
    } = match lifecycle::startup(&config).await {
        Ok(r) => r,
        Err(LifecycleError::LockFailed(_)) => {
            eprintln!(
                "afd is already running against {}",
                config.work_dir.display()
            );
            std::process::exit(1);
        }
        Err(e) => {
            error!("failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let (msg_tx, mut msg_rx) = mpsc::channel::<MsgAnnouncement>(256);
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<CommandCode>(64);
    let (delete_tx, mut delete_rx) = mpsc::channel::<Vec<u32>>(64);
    let (completion_tx, mut completion_rx) = mpsc::channel::<Completion>(256);

    spawn_msg_fifo_reader(config.fifo_dir.clone(), msg_tx);
    spawn_cmd_fifo_reader(config.fifo_dir.clone(), cmd_tx);
    spawn_delete_jobs_reader(config.fifo_dir.clone(), delete_tx);

    let mut resp_fifo = fifos::open_rw(&config.fifo_dir, FD_RESP_FIFO).await?;

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let mut scheduler_tick = tokio::time::interval(config.timer_check);
    let mut reconcile_tick = tokio::time::interval(config.dir_check);

    let mut running: HashMap<u32, JoinHandle<()>> = HashMap::new();
    let mut next_pid: u32 = 1;
    let mut shutting_down: Option<Duration> = None;

    info!(fifo_dir = %config.fifo_dir.display(), "control-plane fifos ready");
    println!("READY");

    'supervisor: loop {
        tokio::select! {
            Some(entry) = msg_rx.recv() => {
                if shutting_down.is_some() {
                    continue;
                }
                handle_announcement(&daemon, &config, entry);
            }

            Some(command) = cmd_rx.recv() => {
                match command {
                    CommandCode::IsAlive => {
                        let _ = write_response(&mut resp_fifo, ResponseCode::Ackn).await;
                    }
                    CommandCode::CheckDir => {
                        reconcile_pass(&daemon, &config, true);
                        let _ = write_response(&mut resp_fifo, ResponseCode::Ackn).await;
                    }
                    CommandCode::DeleteJobs => {
                        // The job-id list itself arrives on delete_jobs_fifo
                        // (spec §4.4); this byte only acknowledges receipt
                        // of the command.
                        let _ = write_response(&mut resp_fifo, ResponseCode::Ackn).await;
                    }
                    CommandCode::Shutdown => {
                        info!("SHUTDOWN received");
                        shutting_down = Some(Duration::from_secs(30));
                    }
                    CommandCode::QuickStop => {
                        info!("QUICK_STOP received");
                        shutting_down = Some(Duration::from_secs(10));
                    }
                    CommandCode::SaveStop => {
                        info!("SAVE_STOP received");
                        shutting_down = Some(Duration::from_secs(30));
                    }
                }
            }

            Some(ids) = delete_rx.recv() => {
                for id in ids {
                    let job_id = JobId::new(id);
                    if let Some(handle) = running.remove(&id) {
                        handle.abort();
                    }
                    delete_job(&daemon, &config, job_id);
                    info!(job_id = id, "job deleted administratively");
                }
            }

            Some(completion) = completion_rx.recv() => {
                running.remove(&completion.job_id.0);
                apply_completion(&daemon, completion);
            }

            _ = scheduler_tick.tick() => {
                if shutting_down.is_none() {
                    dispatch_tick(&daemon, &config, completion_tx.clone(), &mut running, &mut next_pid);
                }
            }

            _ = reconcile_tick.tick() => {
                reconcile_pass(&daemon, &config, false);
            }

            result = event_reader.recv() => {
                match result {
                    Ok(Some(entry)) => {
                        daemon.ambient_state.lock().apply_event(&entry.event);
                        event_reader.mark_processed(entry.seq);
                    }
                    Ok(None) => info!("ambient event bus closed"),
                    Err(e) => error!(error = %e, "error reading ambient event log"),
                }
            }

            _ = sigterm.recv() => {
                info!("received SIGTERM");
                shutting_down = Some(Duration::from_secs(10));
            }

            _ = sigint.recv() => {
                info!("received SIGINT");
                shutting_down = Some(Duration::from_secs(10));
            }
        }

        if let Some(timeout) = shutting_down {
            drain_workers(&daemon, &mut running, &mut completion_rx, timeout).await;
            let _ = write_response(&mut resp_fifo, ResponseCode::ProcTerm).await;
            break 'supervisor;
        }
    }

    daemon.shutdown()?;
    info!("daemon stopped");
    Ok(())
}

/// One finished worker task's report, routed back to the supervisor
/// through `completion_tx` instead of `sf_fin_fifo` + `waitpid` — the
/// worker lives in-process as a spawned task rather than a forked
/// child (spec §9 rearchitecture), so there is no pid to reap.
struct Completion {
    host_alias: HostAlias,
    job_id: JobId,
    slot: usize,
    result: WorkerResult,
}

fn handle_announcement(daemon: &Daemon, config: &Config, entry: MsgAnnouncement) {
    let now_ms = now_epoch_ms();
    let job_id = JobId::new(entry.job_id);
    match afd_engine::ingest_job(
        &daemon.tables,
        &config.messages_dir,
        job_id,
        entry.priority as char,
        entry.creation_time,
        entry.unique_number as u64,
        now_ms,
    ) {
        Ok(afd_engine::IngestOutcome::Queued) => {
            info!(job_id = entry.job_id, "ingested announcement");
            let queued = daemon
                .tables
                .mdb_entry(job_id)
                .zip(daemon.tables.with_queue_entry(job_id, |q| (q.msg_number, q.files_to_send)));
            if let Some((mdb, (msg_number, files_to_send))) = queued {
                let _ = daemon.process_event(Event::JobQueued {
                    job_id,
                    host_alias: mdb.host_alias,
                    msg_number,
                    files_to_send,
                });
            }
        }
        Ok(afd_engine::IngestOutcome::Discarded) => {
            info!(job_id = entry.job_id, "discarded announcement for unknown host");
        }
        Err(e) => warn!(job_id = entry.job_id, error = %e, "failed to ingest announcement"),
    }
}

fn reconcile_pass(daemon: &Daemon, config: &Config, force_check: bool) {
    let now_ms = now_epoch_ms();
    match reconcile_once(
        &daemon.tables,
        &config.messages_dir,
        &config.files_dir,
        MAX_DIRS_PER_RECONCILE_PASS,
        config.max_fd_dir_check,
        MAX_IDLE_MS_BEFORE_REMOVAL,
        now_ms,
        force_check,
    ) {
        Ok(report) => {
            if !report.removed_jobs.is_empty() || !report.recovered_queue_entries.is_empty() {
                info!(
                    removed = report.removed_jobs.len(),
                    recovered = report.recovered_queue_entries.len(),
                    "reconciler removed stale jobs and recovered orphaned directories"
                );
            }
        }
        Err(e) => warn!(error = %e, "reconcile pass failed"),
    }
}

fn apply_completion(daemon: &Daemon, completion: Completion) {
    let events = apply_outcome(
        &daemon.tables,
        &completion.host_alias,
        completion.job_id,
        completion.slot,
        completion.result,
        now_epoch_secs(),
    );
    for event in events {
        if let Err(e) = daemon.process_event(event) {
            warn!(error = %e, "failed to record completion event");
        }
    }
}

fn dispatch_tick(
    daemon: &Daemon,
    config: &Config,
    completion_tx: mpsc::Sender<Completion>,
    running: &mut HashMap<u32, JoinHandle<()>>,
    next_pid: &mut u32,
) {
    let plans = dispatch_ready(
        &daemon.tables,
        now_epoch_secs(),
        config.retry_interval.as_secs(),
        || {
            let pid = *next_pid;
            *next_pid = next_pid.wrapping_add(1).max(1);
            pid
        },
    );
    for plan in plans {
        spawn_worker(daemon, config, plan, completion_tx.clone(), running);
    }
}

fn spawn_worker(
    daemon: &Daemon,
    config: &Config,
    plan: afd_engine::DispatchPlan,
    completion_tx: mpsc::Sender<Completion>,
    running: &mut HashMap<u32, JoinHandle<()>>,
) {
    let tables = Arc::clone(&daemon.tables);
    let messages_dir = config.messages_dir.clone();
    let job_id = plan.job_id;
    let host_alias = plan.host_alias.clone();
    let slot = plan.slot;

    let handle = tokio::spawn(async move {
        let result = run_dispatched_job(&tables, &messages_dir, job_id, &host_alias, slot).await;
        let _ = completion_tx
            .send(Completion {
                host_alias,
                job_id,
                slot,
                result,
            })
            .await;
    });

    running.insert(job_id.0, handle);
}

async fn run_dispatched_job(
    tables: &SharedTables,
    messages_dir: &std::path::Path,
    job_id: JobId,
    host_alias: &HostAlias,
    slot: usize,
) -> WorkerResult {
    let plan = match afd_daemon::dispatch::build_worker_plan(tables, messages_dir, job_id.0) {
        Ok(plan) => plan,
        Err(e) => {
            warn!(job_id = job_id.0, error = %e, "could not build worker plan");
            return WorkerResult {
                exit_code: ExitCode::SyntaxError,
                files_done: 0,
                bytes_done: 0,
            };
        }
    };

    let mut adapter = plan.adapter;
    let ctx = plan.context();
    let outcome = afd_engine::run_transfer_job(
        adapter.as_mut(),
        &plan.target,
        &ctx,
        tables,
        host_alias,
        slot,
        now_epoch_secs(),
    )
    .await;

    WorkerResult {
        exit_code: outcome.exit_code,
        files_done: outcome.files_done,
        bytes_done: outcome.bytes_done,
    }
}

/// Administrative shutdown (spec §5): stop taking new work, wait up to
/// `timeout` for live workers to finish on their own, then abort
/// whatever's left — the async-task analogue of "SIGINT every live
/// worker, SIGKILL after ABORT_TIMEOUT".
async fn drain_workers(
    daemon: &Daemon,
    running: &mut HashMap<u32, JoinHandle<()>>,
    completion_rx: &mut mpsc::Receiver<Completion>,
    timeout: Duration,
) {
    if running.is_empty() {
        return;
    }
    info!(live_workers = running.len(), ?timeout, "draining workers before shutdown");
    let deadline = tokio::time::Instant::now() + timeout;
    while !running.is_empty() && tokio::time::Instant::now() < deadline {
        tokio::select! {
            Some(completion) = completion_rx.recv() => {
                running.remove(&completion.job_id.0);
                apply_completion(daemon, completion);
            }
            _ = tokio::time::sleep(Duration::from_millis(100)) => {}
        }
    }
    for (job_id, handle) in running.drain() {
        warn!(job_id, "aborting worker past shutdown grace period");
        handle.abort();
    }
}

fn delete_job(daemon: &Daemon, config: &Config, job_id: JobId) {
    daemon.tables.remove_queue_entry(job_id);
    daemon.tables.remove_mdb(job_id);
    daemon.tables.with_jid(|jid| jid.remove_job(job_id));
    let message_path = config.messages_dir.join(job_id.0.to_string());
    let _ = std::fs::remove_file(message_path);
}

fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

async fn write_response(file: &mut tokio::fs::File, code: ResponseCode) -> std::io::Result<()> {
    file.write_all(&[code.byte()]).await
}

/// Reads fixed-width [`MsgAnnouncement`] frames off `msg_fifo` and
/// forwards them to the supervisor loop (spec §4.4). Framed by a fixed
/// byte width rather than a newline, per spec "higher-level messages are
/// framed by fixed lengths, never by newlines".
fn spawn_msg_fifo_reader(fifo_dir: std::path::PathBuf, tx: mpsc::Sender<MsgAnnouncement>) {
    tokio::spawn(async move {
        loop {
            let mut file = match fifos::open_rw(&fifo_dir, MSG_FIFO).await {
                Ok(f) => f,
                Err(e) => {
                    error!(error = %e, "could not open msg_fifo");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };
            let mut buf = [0u8; MSG_ANNOUNCEMENT_LEN];
            loop {
                match file.read_exact(&mut buf).await {
                    Ok(()) => match MsgAnnouncement::from_bytes(&buf) {
                        Ok(announcement) => {
                            if tx.send(announcement).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => warn!(error = %e, "malformed msg_fifo frame, skipped"),
                    },
                    Err(e) => {
                        warn!(error = %e, "msg_fifo read failed, reopening");
                        break;
                    }
                }
            }
        }
    });
}

/// Reads single command bytes off `fd_cmd_fifo`. Unknown bytes are
/// logged and skipped rather than tearing down the reader (spec §4.4
/// "readers ... must treat unknown command bytes as garbage to
/// log-and-skip").
fn spawn_cmd_fifo_reader(fifo_dir: std::path::PathBuf, tx: mpsc::Sender<CommandCode>) {
    tokio::spawn(async move {
        loop {
            let mut file = match fifos::open_rw(&fifo_dir, FD_CMD_FIFO).await {
                Ok(f) => f,
                Err(e) => {
                    error!(error = %e, "could not open fd_cmd_fifo");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };
            let mut buf = [0u8; 1];
            loop {
                match file.read_exact(&mut buf).await {
                    Ok(()) => match CommandCode::from_byte(buf[0]) {
                        Ok(code) => {
                            if tx.send(code).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => warn!(error = %e, "unknown command byte, skipped"),
                    },
                    Err(e) => {
                        warn!(error = %e, "fd_cmd_fifo read failed, reopening");
                        break;
                    }
                }
            }
        }
    });
}

/// Reads length-prefixed job-id lists off `delete_jobs_fifo` (spec
/// §4.4).
fn spawn_delete_jobs_reader(fifo_dir: std::path::PathBuf, tx: mpsc::Sender<Vec<u32>>) {
    tokio::spawn(async move {
        loop {
            let mut file = match fifos::open_rw(&fifo_dir, DELETE_JOBS_FIFO).await {
                Ok(f) => f,
                Err(e) => {
                    error!(error = %e, "could not open delete_jobs_fifo");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };
            loop {
                let mut len_buf = [0u8; 4];
                if let Err(e) = file.read_exact(&mut len_buf).await {
                    warn!(error = %e, "delete_jobs_fifo read failed, reopening");
                    break;
                }
                let count = u32::from_be_bytes(len_buf) as usize;
                let mut payload = vec![0u8; 4 + count * 4];
                payload[0..4].copy_from_slice(&len_buf);
                if let Err(e) = file.read_exact(&mut payload[4..]).await {
                    warn!(error = %e, "delete_jobs_fifo truncated frame, reopening");
                    break;
                }
                match control::decode_delete_jobs(&payload) {
                    Ok(ids) => {
                        if tx.send(ids).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => warn!(error = %e, "malformed delete_jobs_fifo frame, skipped"),
                }
            }
        }
    });
}

/// Rotates `afd.log` → `afd.log.1` → … → `afd.log.3` if the current log
/// exceeds [`MAX_LOG_SIZE`]. Best-effort: failures are silently ignored
/// so the daemon still starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }
    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoWorkDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoWorkDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

fn print_help() {
    println!("afd {}", env!("CARGO_PKG_VERSION"));
    println!("Automatic File Distributor — schedules and dispatches outgoing file transfers");
    println!();
    println!("USAGE:");
    println!("    afd");
    println!();
    println!("The daemon is typically started and controlled by `afd-ctl`.");
    println!("It owns the control-plane fifos under $AFD_WORK_DIR/fifodir and");
    println!("should not normally be invoked directly.");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -v, --version    Print version information");
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
