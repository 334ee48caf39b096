// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `AFD_MON_CONFIG` grammar (spec §6): one remote AFD per line,
//! whitespace-separated fields: `AFDALIAS HOSTNAME[:HOSTNAME2]
//! PORT[:PORT2] POLL_S RCMD OPTIONS`. Blank lines and lines starting with
//! `#` are comments and are skipped.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonConfigError {
    #[error("line {line}: expected at least 4 fields (alias, hostname, port, poll interval), got {got}")]
    TooFewFields { line: usize, got: usize },
    #[error("line {line}: invalid port {value:?}")]
    InvalidPort { line: usize, value: String },
    #[error("line {line}: invalid poll interval {value:?}")]
    InvalidPollInterval { line: usize, value: String },
}

/// One configured remote AFD (one MSA entry, spec §3/§4.10).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonConfigEntry {
    pub alias: String,
    pub hostnames: (String, Option<String>),
    pub ports: (u16, Option<u16>),
    pub poll_interval_secs: u32,
    pub rcmd: Option<String>,
    pub options: Vec<String>,
}

fn split_pair(field: &str) -> (String, Option<String>) {
    match field.split_once(':') {
        Some((a, b)) => (a.to_string(), Some(b.to_string())),
        None => (field.to_string(), None),
    }
}

/// Parses the full contents of an `AFD_MON_CONFIG` file.
pub fn parse_mon_config(contents: &str) -> Result<Vec<MonConfigEntry>, MonConfigError> {
    let mut entries = Vec::new();
    for (idx, raw_line) in contents.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(MonConfigError::TooFewFields {
                line: line_no,
                got: fields.len(),
            });
        }
        let alias = fields[0].to_string();
        let hostnames = split_pair(fields[1]);
        let (port_a, port_b) = split_pair(fields[2]);
        let port_a: u16 = port_a.parse().map_err(|_| MonConfigError::InvalidPort {
            line: line_no,
            value: fields[2].to_string(),
        })?;
        let port_b = port_b
            .map(|p| {
                p.parse().map_err(|_| MonConfigError::InvalidPort {
                    line: line_no,
                    value: fields[2].to_string(),
                })
            })
            .transpose()?;
        let poll_interval_secs: u32 =
            fields[3]
                .parse()
                .map_err(|_| MonConfigError::InvalidPollInterval {
                    line: line_no,
                    value: fields[3].to_string(),
                })?;
        let rcmd = fields.get(4).map(|s| s.to_string());
        let options = fields.get(5..).map(|rest| rest.iter().map(|s| s.to_string()).collect()).unwrap_or_default();

        entries.push(MonConfigEntry {
            alias,
            hostnames,
            ports: (port_a, port_b),
            poll_interval_secs,
            rcmd,
            options,
        });
    }
    Ok(entries)
}

#[cfg(test)]
#[path = "mon_config_tests.rs"]
mod tests;
