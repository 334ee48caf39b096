// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `afd-ctl` — the administrative CLI for a running `afd` daemon (spec
//! §6 "Control CLI"): issues the single-byte `fd_cmd_fifo` commands and
//! renders `fd_resp_fifo` replies, plus a read-only `status` query.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod color;
mod status;
mod table;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};

use afd_daemon::control::{CommandCode, ResponseCode};
use client::FdClient;

#[derive(Parser)]
#[command(
    name = "afd-ctl",
    version,
    about = "Control CLI for the Automatic File Distributor"
)]
struct Cli {
    /// FD work directory (default: AFD_WORK_DIR, else XDG_STATE_HOME/afd,
    /// else ~/.local/state/afd — spec §6).
    #[arg(short = 'w', long = "work-dir", global = true, value_name = "DIR")]
    work_dir: Option<PathBuf>,

    /// How long to wait for the daemon to respond before giving up.
    #[arg(long = "timeout-ms", global = true, default_value_t = 5_000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Request a graceful shutdown (drains in-flight transfers first).
    Shutdown,
    /// Check whether the daemon is alive and responding.
    IsAlive,
    /// Stop dispatching new transfers, but don't wait for active ones.
    QuickStop,
    /// Stop dispatching new transfers, persisting queue state first.
    SaveStop,
    /// Administratively delete one or more queued/in-flight jobs.
    DeleteJobs {
        /// Job IDs to delete.
        #[arg(required = true)]
        job_ids: Vec<u32>,
    },
    /// Force an immediate watched-directory reconciliation sweep.
    CheckDir,
    /// Print a snapshot of host/queue state.
    Status {
        /// Keep tailing the ambient event log after the snapshot.
        #[arg(long)]
        follow: bool,
    },
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        eprintln!("Error: {}", format_error(&e));
        std::process::exit(1);
    }
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Format an anyhow error, deduplicating the chain.
///
/// If the top-level Display already contains the source error text, skip
/// the "Caused by" chain to avoid noisy duplicate output (common when
/// thiserror variants use `#[error("... {0}")]` with `#[from]`).
/// Otherwise render the full chain so context isn't lost.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

fn cli_command() -> clap::Command {
    Cli::command().styles(color::styles())
}

async fn run() -> Result<()> {
    let matches = cli_command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    let work_dir = match cli.work_dir {
        Some(dir) => dir,
        None => afd_daemon::env::work_dir().context("resolving FD work directory")?,
    };
    let timeout = Duration::from_millis(cli.timeout_ms);

    match cli.command {
        Commands::Status { follow } => {
            status::run(&work_dir, follow).await?;
            return Ok(());
        }
        command => {
            let fifo_dir = work_dir.join("fifodir");
            let client = FdClient::new(fifo_dir);
            let response = dispatch(&client, command, timeout).await?;
            print_response(response);
        }
    }

    Ok(())
}

async fn dispatch(
    client: &FdClient,
    command: Commands,
    timeout: Duration,
) -> Result<ResponseCode> {
    let response = match command {
        Commands::Shutdown => client.command(CommandCode::Shutdown, timeout).await,
        Commands::IsAlive => client.command(CommandCode::IsAlive, timeout).await,
        Commands::QuickStop => client.command(CommandCode::QuickStop, timeout).await,
        Commands::SaveStop => client.command(CommandCode::SaveStop, timeout).await,
        Commands::CheckDir => client.command(CommandCode::CheckDir, timeout).await,
        Commands::DeleteJobs { job_ids } => client.delete_jobs(&job_ids, timeout).await,
        Commands::Status { .. } => unreachable!("handled in run()"),
    };
    response.context("control request failed")
}

fn print_response(response: ResponseCode) {
    match response {
        ResponseCode::Ackn => println!("{}", color::green("ACKN")),
        ResponseCode::ProcTerm => println!("{}", color::green("PROC_TERM")),
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
