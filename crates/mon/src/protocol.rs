// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AFDD text protocol (spec §6, §4.10): two-letter prefix, space, tokens
//! separated by spaces, line terminator `\r\n`. Unknown prefixes are
//! logged and skipped rather than treated as fatal, matching the control
//! fifo's "malformed frame is logged and skipped" discipline elsewhere in
//! this tree. Numeric response lines of shape `DDD-` are ordinary
//! acknowledgements and carry no state of their own.

use thiserror::Error;

use afd_core::msa::{ConnectStatus, DayCounters, HostErrorHistory, MsaEntry};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty line")]
    Empty,
    #[error("unknown prefix {0:?}")]
    UnknownPrefix(String),
    #[error("{prefix}: expected {expected} fields, got {got}")]
    WrongFieldCount {
        prefix: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{prefix}: could not parse field {field:?}")]
    BadField { prefix: &'static str, field: String },
}

/// The literal line a remote AFDD sends to announce it is tearing its
/// listener down.
pub const SHUTDOWN_LINE: &str = "AFDD SHUTDOWN";

/// One decoded AFDD protocol line.
#[derive(Debug, Clone, PartialEq)]
pub enum AfddLine {
    /// `IS`: interval summary — file count, file size, transfer rate,
    /// file rate, and the running host-error counter.
    IntervalSummary {
        file_counter: u64,
        file_size: u64,
        transfer_rate: u64,
        file_rate: u64,
        host_error_counter: u32,
    },
    AmgRunning(bool),
    FdRunning(bool),
    ArchiveWatchRunning(bool),
    HostCount(u32),
    DirCount(u32),
    JobsInQueue(u32),
    ActiveTransfers(u32),
    /// `HL index name`: a host-table row. Recorded only for its side
    /// effect on `no_of_hosts` bookkeeping upstream; the row contents
    /// themselves aren't retained by the monitor core.
    HostRow { index: u32, name: String },
    /// `DL index name`: a directory-table row, same treatment as `HostRow`.
    DirRow { index: u32, name: String },
    /// `EL index name error_counter`: one host's error-history row.
    ErrorRow {
        index: u32,
        host_alias: String,
        error_counter: u32,
    },
    /// `SR fifo_name entry_count`: system-log colour fifo plus its
    /// current entry count.
    SystemLogRing { fifo_name: String, entry_count: u32 },
    ReceiveLogHistory(Vec<String>),
    SystemLogHistory(Vec<String>),
    TransferLogHistory(Vec<String>),
    Version(String),
    RemoteWorkDir(String),
    LogCapabilities(Vec<String>),
    Shutdown,
    /// A numeric `DDD-` acknowledgement line, carrying no state.
    Ack(u16),
}

fn split(line: &str) -> Vec<&str> {
    line.split(' ').filter(|s| !s.is_empty()).collect()
}

fn parse_bool(prefix: &'static str, field: &str) -> Result<bool, ProtocolError> {
    match field {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(ProtocolError::BadField {
            prefix,
            field: other.to_string(),
        }),
    }
}

fn parse_u32(prefix: &'static str, field: &str) -> Result<u32, ProtocolError> {
    field.parse().map_err(|_| ProtocolError::BadField {
        prefix,
        field: field.to_string(),
    })
}

fn parse_u64(prefix: &'static str, field: &str) -> Result<u64, ProtocolError> {
    field.parse().map_err(|_| ProtocolError::BadField {
        prefix,
        field: field.to_string(),
    })
}

fn require(prefix: &'static str, fields: &[&str], expected: usize) -> Result<(), ProtocolError> {
    if fields.len() != expected {
        return Err(ProtocolError::WrongFieldCount {
            prefix,
            expected,
            got: fields.len(),
        });
    }
    Ok(())
}

/// Parses one line of the AFDD text protocol, already stripped of its
/// `\r\n` terminator.
pub fn parse_line(line: &str) -> Result<AfddLine, ProtocolError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line == SHUTDOWN_LINE {
        return Ok(AfddLine::Shutdown);
    }
    if line.is_empty() {
        return Err(ProtocolError::Empty);
    }
    if let Some(rest) = line.strip_suffix('-') {
        if rest.len() == 3 && rest.chars().all(|c| c.is_ascii_digit()) {
            let code: u16 = rest.parse().unwrap_or_default();
            return Ok(AfddLine::Ack(code));
        }
    }

    let (prefix, rest) = line.split_at(line.find(' ').unwrap_or(line.len()));
    let fields = split(rest);

    match prefix {
        "IS" => {
            require("IS", &fields, 5)?;
            Ok(AfddLine::IntervalSummary {
                file_counter: parse_u64("IS", fields[0])?,
                file_size: parse_u64("IS", fields[1])?,
                transfer_rate: parse_u64("IS", fields[2])?,
                file_rate: parse_u64("IS", fields[3])?,
                host_error_counter: parse_u32("IS", fields[4])?,
            })
        }
        "AM" => {
            require("AM", &fields, 1)?;
            Ok(AfddLine::AmgRunning(parse_bool("AM", fields[0])?))
        }
        "FD" => {
            require("FD", &fields, 1)?;
            Ok(AfddLine::FdRunning(parse_bool("FD", fields[0])?))
        }
        "AW" => {
            require("AW", &fields, 1)?;
            Ok(AfddLine::ArchiveWatchRunning(parse_bool("AW", fields[0])?))
        }
        "NH" => {
            require("NH", &fields, 1)?;
            Ok(AfddLine::HostCount(parse_u32("NH", fields[0])?))
        }
        "ND" => {
            require("ND", &fields, 1)?;
            Ok(AfddLine::DirCount(parse_u32("ND", fields[0])?))
        }
        "NJ" => {
            require("NJ", &fields, 1)?;
            Ok(AfddLine::JobsInQueue(parse_u32("NJ", fields[0])?))
        }
        "MC" => {
            require("MC", &fields, 1)?;
            Ok(AfddLine::ActiveTransfers(parse_u32("MC", fields[0])?))
        }
        "HL" => {
            require("HL", &fields, 2)?;
            Ok(AfddLine::HostRow {
                index: parse_u32("HL", fields[0])?,
                name: fields[1].to_string(),
            })
        }
        "DL" => {
            require("DL", &fields, 2)?;
            Ok(AfddLine::DirRow {
                index: parse_u32("DL", fields[0])?,
                name: fields[1].to_string(),
            })
        }
        "EL" => {
            require("EL", &fields, 3)?;
            Ok(AfddLine::ErrorRow {
                index: parse_u32("EL", fields[0])?,
                host_alias: fields[1].to_string(),
                error_counter: parse_u32("EL", fields[2])?,
            })
        }
        "SR" => {
            require("SR", &fields, 2)?;
            Ok(AfddLine::SystemLogRing {
                fifo_name: fields[0].to_string(),
                entry_count: parse_u32("SR", fields[1])?,
            })
        }
        "RH" => Ok(AfddLine::ReceiveLogHistory(
            fields.iter().map(|s| s.to_string()).collect(),
        )),
        "SH" => Ok(AfddLine::SystemLogHistory(
            fields.iter().map(|s| s.to_string()).collect(),
        )),
        "TH" => Ok(AfddLine::TransferLogHistory(
            fields.iter().map(|s| s.to_string()).collect(),
        )),
        "AV" => {
            require("AV", &fields, 1)?;
            Ok(AfddLine::Version(fields[0].to_string()))
        }
        "WD" => {
            require("WD", &fields, 1)?;
            Ok(AfddLine::RemoteWorkDir(fields[0].to_string()))
        }
        "LC" => Ok(AfddLine::LogCapabilities(
            fields.iter().map(|s| s.to_string()).collect(),
        )),
        other => Err(ProtocolError::UnknownPrefix(other.to_string())),
    }
}

/// Applies one decoded line to an in-memory MSA entry. `hour_bucket`
/// (wall-clock epoch seconds / 3600) identifies the current hour for the
/// `RH`/`SH`/`TH` ring's shift-once gate (spec §4.10, invariant 9): a
/// batch at least as long as the history's capacity replaces the ring
/// wholesale (a full hourly refresh); a shorter batch shifts the ring
/// left by one entry only the first time it's seen for `hour_bucket`, and
/// just overwrites the tail on every subsequent short batch in that hour.
pub fn apply_to(entry: &mut MsaEntry, line: &AfddLine, hour_bucket: u64) {
    match line {
        AfddLine::IntervalSummary {
            host_error_counter, ..
        } => {
            entry.host_error_counter = *host_error_counter;
            entry.push_day_counters(DayCounters {
                transfer_rate: 0,
                file_rate: 0,
                active_transfers: entry.active_transfers,
            });
        }
        AfddLine::AmgRunning(running) => entry.amg_running = *running,
        AfddLine::FdRunning(running) => entry.fd_running = *running,
        AfddLine::ArchiveWatchRunning(running) => entry.archive_watch_running = *running,
        AfddLine::HostCount(n) => entry.no_of_hosts = *n,
        AfddLine::DirCount(n) => entry.no_of_dirs = *n,
        AfddLine::JobsInQueue(n) => entry.jobs_in_queue = *n,
        AfddLine::ActiveTransfers(n) => entry.active_transfers = *n,
        AfddLine::HostRow { .. } | AfddLine::DirRow { .. } => {}
        AfddLine::ErrorRow {
            index,
            host_alias,
            error_counter,
        } => {
            let idx = *index as usize;
            if idx >= entry.host_error_histories.len() {
                entry
                    .host_error_histories
                    .resize(idx + 1, HostErrorHistory::default());
            }
            entry.host_error_histories[idx] = HostErrorHistory {
                host_alias: host_alias.clone(),
                error_counter: *error_counter,
            };
        }
        AfddLine::SystemLogRing { .. } => {}
        AfddLine::ReceiveLogHistory(lines) => entry.receive_log.apply_update(lines, hour_bucket),
        AfddLine::SystemLogHistory(lines) => entry.system_log.apply_update(lines, hour_bucket),
        AfddLine::TransferLogHistory(lines) => entry.transfer_log.apply_update(lines, hour_bucket),
        AfddLine::Version(v) => entry.remote_version = v.clone(),
        AfddLine::RemoteWorkDir(dir) => entry.remote_work_dir = dir.clone(),
        AfddLine::LogCapabilities(_) => {}
        AfddLine::Shutdown => entry.connect_status = ConnectStatus::Disconnected,
        AfddLine::Ack(_) => {}
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
