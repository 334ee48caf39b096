// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job message file format (spec §6): `[destination]`/`recipient` URL
//! followed by `[options]`, one option per line. Exposes both the whole-file
//! parse/render and the `log_append`/`remove_append`/`remove_all_appends`
//! helpers spec §4.8 describes in terms of a locked, in-place file edit —
//! here expressed as pure text transforms; the caller (the engine crate,
//! via `afd-storage`) is responsible for the file lock and atomic rewrite
//! around them.

use crate::options::JobOption;
use afd_core::append::AppendList;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("missing [destination] section")]
    MissingDestination,
    #[error("missing recipient line in [destination] section")]
    MissingRecipient,
}

/// The `[options]` section: ordinary options in file order, plus the
/// `restart` list tracked separately for its idempotent insert/remove
/// semantics (spec §4.8).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionsSection {
    pub options: Vec<JobOption>,
    pub restart: AppendList,
}

impl OptionsSection {
    pub fn is_empty(&self) -> bool {
        self.options.is_empty() && self.restart.is_empty()
    }

    fn parse(body: &str) -> Self {
        let mut options = Vec::new();
        let mut restart = AppendList::new();
        for line in body.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed == "restart" || trimmed.starts_with("restart ") {
                restart = AppendList::parse_option_line(trimmed);
                continue;
            }
            if let Some(opt) = JobOption::parse_line(trimmed) {
                options.push(opt);
            }
        }
        Self { options, restart }
    }

    fn render(&self) -> String {
        let mut lines: Vec<String> = self.options.iter().map(JobOption::render_line).collect();
        if let Some(line) = self.restart.render_option_line() {
            lines.push(line);
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobMessage {
    pub recipient: String,
    pub section: OptionsSection,
}

impl JobMessage {
    pub fn parse(text: &str) -> Result<Self, MessageError> {
        let dest_start = text
            .find("[destination]")
            .ok_or(MessageError::MissingDestination)?;
        let after_dest = &text[dest_start + "[destination]".len()..];
        let dest_end = after_dest.find("[options]").unwrap_or(after_dest.len());
        let dest_body = &after_dest[..dest_end];

        let recipient = dest_body
            .lines()
            .find_map(|l| l.trim().strip_prefix("recipient "))
            .map(str::trim)
            .ok_or(MessageError::MissingRecipient)?
            .to_string();

        let section = match text.find("[options]") {
            Some(opt_start) => {
                let body = &text[opt_start + "[options]".len()..];
                OptionsSection::parse(body)
            }
            None => OptionsSection::default(),
        };

        Ok(Self { recipient, section })
    }

    pub fn render(&self) -> String {
        let mut out = format!("[destination]\nrecipient {}\n", self.recipient);
        if !self.section.is_empty() {
            out.push_str("[options]\n");
            out.push_str(&self.section.render());
            out.push('\n');
        }
        out
    }
}

/// `log_append` (spec §4.8): idempotently adds `filename` to the job
/// message's restart list, creating the `[options]` section if absent.
/// Returns the rewritten file contents.
pub fn log_append(contents: &str, filename: &str) -> Result<String, MessageError> {
    let mut msg = JobMessage::parse(contents)?;
    msg.section.restart.append(filename);
    Ok(msg.render())
}

/// `remove_append` (spec §4.8): removes one filename from the restart
/// list, collapsing the whole `restart` option away once the list is
/// empty.
pub fn remove_append(contents: &str, filename: &str) -> Result<String, MessageError> {
    let mut msg = JobMessage::parse(contents)?;
    msg.section.restart.remove(filename);
    Ok(msg.render())
}

/// `remove_all_appends` (spec §4.8): drops the entire restart option.
pub fn remove_all_appends(contents: &str) -> Result<String, MessageError> {
    let mut msg = JobMessage::parse(contents)?;
    msg.section.restart.clear();
    Ok(msg.render())
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
