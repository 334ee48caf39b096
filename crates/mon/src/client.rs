// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One remote AFD's AFDD connection: connects, reads `\r\n`-terminated
//! lines, and applies each decoded line to the shared MSA entry. Runs
//! until the connection drops or the remote sends `AFDD SHUTDOWN`, at
//! which point it reports back to its supervising task so the crash-loop
//! backoff in [`crate::supervisor`] can decide whether to reconnect.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use afd_core::msa::{ConnectStatus, MsaEntry};

use crate::protocol::{self, AfddLine, ProtocolError};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connect to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Wall-clock hour bucket used to gate the log-history shift-once rule
/// (spec §4.10, invariant 9).
fn hour_bucket() -> u64 {
    now_epoch_ms() / 3_600_000
}

/// Runs one AFDD polling session against `host:port`, feeding every
/// decoded line into `entry` until the connection closes or the remote
/// signals shutdown. Returns normally in both cases; the caller decides
/// whether/when to reconnect.
pub async fn poll_once(
    host: &str,
    port: u16,
    entry: &Arc<Mutex<MsaEntry>>,
) -> Result<(), ClientError> {
    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|source| ClientError::Connect {
            host: host.to_string(),
            port,
            source,
        })?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    {
        let mut e = entry.lock();
        e.connect_status = ConnectStatus::Established;
        e.last_connect_time_epoch_ms = Some(now_epoch_ms());
    }
    info!(host, port, "afdd connection established");

    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            break;
        }
        match protocol::parse_line(line.trim_end_matches(['\r', '\n'])) {
            Ok(AfddLine::Shutdown) => {
                info!(host, port, "afdd sent shutdown");
                break;
            }
            Ok(decoded) => protocol::apply_to(&mut entry.lock(), &decoded, hour_bucket()),
            Err(ProtocolError::Empty) => continue,
            Err(e) => warn!(host, port, error = %e, "unparseable afdd line, skipping"),
        }
    }

    let _ = write_half.shutdown().await;
    {
        let mut e = entry.lock();
        e.connect_status = ConnectStatus::Disconnected;
        e.last_disconnect_time_epoch_ms = Some(now_epoch_ms());
    }
    debug!(host, port, "afdd connection closed");
    Ok(())
}
