// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `afd_mon`: the remote monitor binary. Owns the `mon_cmd_fifo`/
//! `mon_resp_fifo` pair, polls every remote AFD listed in
//! `AFD_MON_CONFIG` through [`afd_mon::supervisor`], and persists their
//! status into the MSA arena.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{info, warn};

use afd_mon::active::{self, ActiveRecord};
use afd_mon::control::{self, CommandCode, ResponseCode};
use afd_mon::env;
use afd_mon::msa_store::MsaStore;
use afd_mon::supervisor;

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;
const MAX_ROTATED_LOGS: u32 = 3;

struct Config {
    work_dir: PathBuf,
    fifo_dir: PathBuf,
    arena_dir: PathBuf,
    log_path: PathBuf,
    active_path: PathBuf,
    mon_config_path: PathBuf,
}

impl Config {
    fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let work_dir = env::work_dir()?;
        let fifo_dir = work_dir.join("fifodir");
        Ok(Self {
            mon_config_path: env::mon_config_path(&work_dir),
            active_path: fifo_dir.join(active::MON_ACTIVE_FILE),
            arena_dir: work_dir.join("arenas"),
            log_path: work_dir.join("log").join("AFD_MON_LOG"),
            fifo_dir,
            work_dir,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("afd_mon {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: afd_mon [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    std::fs::create_dir_all(&config.work_dir)?;
    std::fs::create_dir_all(&config.fifo_dir)?;
    rotate_log_if_needed(&config.log_path);
    let _guard = setup_logging(&config)?;

    active::probe_and_clear_stale(&config.fifo_dir, &config.active_path).await?;
    control::ensure_all(&config.fifo_dir)?;

    let store = Arc::new(MsaStore::open(&config.arena_dir)?);

    let contents = std::fs::read_to_string(&config.mon_config_path).unwrap_or_default();
    let entries = afd_runbook::mon_config::parse_mon_config(&contents).unwrap_or_else(|e| {
        warn!(error = %e, "AFD_MON_CONFIG parse error, starting with no monitored remotes");
        Vec::new()
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let next_worker_id = Arc::new(AtomicU32::new(1));
    let mut worker_ids = Vec::new();
    let mut tasks = Vec::new();

    for remote in entries {
        let entry = store.ensure_entry(
            &remote.alias,
            env::max_log_history(),
            env::storage_time_days(),
        )?;
        let worker_id = next_worker_id.fetch_add(1, Ordering::Relaxed);
        worker_ids.push(worker_id);
        let rx = shutdown_rx.clone();
        tasks.push(tokio::spawn(supervisor::supervise_one(remote, entry, rx)));
    }

    write_active(&config, &worker_ids)?;

    let mut cmd_fifo = control::open_rw(&config.fifo_dir, control::MON_CMD_FIFO).await?;
    let mut resp_fifo = control::open_rw(&config.fifo_dir, control::MON_RESP_FIFO).await?;
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

    println!("READY");
    info!(monitored = tasks.len(), "afd_mon running");

    'supervisor: loop {
        tokio::select! {
            byte = read_command_byte(&mut cmd_fifo) => {
                match byte {
                    Ok(Some(b)) => match CommandCode::from_byte(b) {
                        Ok(CommandCode::IsAlive) => {
                            let _ = resp_fifo.write_all(&[ResponseCode::Ackn.byte()]).await;
                        }
                        Ok(CommandCode::Shutdown) => {
                            let _ = resp_fifo.write_all(&[ResponseCode::Ackn.byte()]).await;
                            break 'supervisor;
                        }
                        Err(e) => warn!(error = %e, "malformed mon_cmd_fifo byte, skipping"),
                    },
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "mon_cmd_fifo read error"),
                }
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break 'supervisor;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break 'supervisor;
            }
        }
    }

    let _ = shutdown_tx.send(true);
    for task in tasks {
        let _ = task.await;
    }
    let _ = store.persist();
    let _ = std::fs::remove_file(&config.active_path);
    info!("afd_mon shutdown complete");
    Ok(())
}

async fn read_command_byte(
    file: &mut tokio::fs::File,
) -> std::io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    match file.read(&mut buf).await? {
        0 => {
            // Writer closed their end; re-open so the fifo doesn't spin
            // on an immediate EOF while this handle still holds the read
            // side open.
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok(None)
        }
        _ => Ok(Some(buf[0])),
    }
}

fn write_active(config: &Config, worker_pids: &[u32]) -> std::io::Result<()> {
    active::write_active(
        &config.active_path,
        &ActiveRecord {
            supervisor_pid: std::process::id(),
            log_pids: [0, 0],
            worker_pids: worker_pids.to_vec(),
        },
    )
}

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
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or("no log directory")?,
        config.log_path.file_name().ok_or("no log file name")?,
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
    println!("afd_mon {}", env!("CARGO_PKG_VERSION"));
    println!("Remote monitor — polls remote AFDs' AFDD ports and tracks their status");
    println!();
    println!("USAGE:");
    println!("    afd_mon");
    println!();
    println!("Remotes to poll are read from AFD_MON_CONFIG under $AFD_MON_WORK_DIR.");
    println!("It owns mon_cmd_fifo/mon_resp_fifo under $AFD_MON_WORK_DIR/fifodir and");
    println!("should not normally be invoked directly.");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -v, --version    Print version information");
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
