// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `[options]` section lines of a job message file (spec §6). Options are
//! order-insensitive; each occupies one line of the form `<name> <value>`
//! (or a bare `<name>` for flag-only options like `attach file`).

/// One recognised `[options]` line. `restart` is modelled separately by
/// [`afd_core::AppendList`] since it is the only option with its own
/// idempotent insert/remove semantics (spec §4.8); everything else is a
/// simple value or flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOption {
    Archive(u64),
    AgeLimit(u64),
    Lock(LockRegime),
    TransRename(String),
    Subject(String),
    AttachFile,
    Mode(TransferMode),
    Chmod(String),
    Chown(String),
    Site(String),
    /// An option this parser does not recognise by name; kept verbatim so
    /// round-tripping the file never silently drops configuration.
    Unknown(String, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockRegime {
    Dot,
    DotVms,
    Lockfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Active,
    Passive,
}

impl JobOption {
    /// Parses one non-`restart` `[options]` line (name + optional value,
    /// whitespace separated). Returns `None` for blank lines.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (name, value) = match line.split_once(char::is_whitespace) {
            Some((n, v)) => (n, v.trim()),
            None => (line, ""),
        };
        Some(match name {
            "archive" => JobOption::Archive(value.parse().unwrap_or(0)),
            "age-limit" => JobOption::AgeLimit(value.parse().unwrap_or(0)),
            "lock" => JobOption::Lock(match value {
                "DOT_VMS" => LockRegime::DotVms,
                "LOCKFILE" => LockRegime::Lockfile,
                _ => LockRegime::Dot,
            }),
            "trans_rename" => JobOption::TransRename(value.to_string()),
            "subject" => JobOption::Subject(value.to_string()),
            "attach" => JobOption::AttachFile,
            "mode" => JobOption::Mode(if value == "passive" {
                TransferMode::Passive
            } else {
                TransferMode::Active
            }),
            "chmod" => JobOption::Chmod(value.to_string()),
            "chown" => JobOption::Chown(value.to_string()),
            "site" => JobOption::Site(value.to_string()),
            other => JobOption::Unknown(other.to_string(), value.to_string()),
        })
    }

    pub fn render_line(&self) -> String {
        match self {
            JobOption::Archive(secs) => format!("archive {secs}"),
            JobOption::AgeLimit(secs) => format!("age-limit {secs}"),
            JobOption::Lock(regime) => format!(
                "lock {}",
                match regime {
                    LockRegime::Dot => "DOT",
                    LockRegime::DotVms => "DOT_VMS",
                    LockRegime::Lockfile => "LOCKFILE",
                }
            ),
            JobOption::TransRename(rule) => format!("trans_rename {rule}"),
            JobOption::Subject(text) => format!("subject {text}"),
            JobOption::AttachFile => "attach file".to_string(),
            JobOption::Mode(mode) => format!(
                "mode {}",
                match mode {
                    TransferMode::Active => "active",
                    TransferMode::Passive => "passive",
                }
            ),
            JobOption::Chmod(oct) => format!("chmod {oct}"),
            JobOption::Chown(ids) => format!("chown {ids}"),
            JobOption::Site(cmd) => format!("site {cmd}"),
            JobOption::Unknown(name, value) if value.is_empty() => name.clone(),
            JobOption::Unknown(name, value) => format!("{name} {value}"),
        }
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
