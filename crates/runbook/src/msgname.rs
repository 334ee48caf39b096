// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message-name shape: `<priority>_<creation_time>_<unique>_<job_id>`
//! (spec §6 "Message-name shape"). `_` is the field separator and no
//! field may itself contain `_`, so the grammar is a plain four-way split.

use afd_core::message::JobId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageNameError {
    #[error("message name {0:?} does not have 4 underscore-separated fields")]
    WrongFieldCount(String),
    #[error("message name {0:?} has an empty priority field")]
    EmptyPriority(String),
    #[error("message name {0:?} has a non-numeric {field} field")]
    NotNumeric { name: String, field: &'static str },
}

/// A parsed message name: `<priority>_<creation_time>_<unique>_<job_id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageName {
    pub priority: char,
    pub creation_time: u64,
    pub unique: u64,
    pub job_id: JobId,
}

impl MessageName {
    pub fn parse(name: &str) -> Result<Self, MessageNameError> {
        let fields: Vec<&str> = name.split('_').collect();
        if fields.len() != 4 {
            return Err(MessageNameError::WrongFieldCount(name.to_string()));
        }
        let mut chars = fields[0].chars();
        let priority = chars
            .next()
            .ok_or_else(|| MessageNameError::EmptyPriority(name.to_string()))?;
        if chars.next().is_some() {
            return Err(MessageNameError::EmptyPriority(name.to_string()));
        }
        let creation_time = fields[1]
            .parse()
            .map_err(|_| MessageNameError::NotNumeric {
                name: name.to_string(),
                field: "creation_time",
            })?;
        let unique = fields[2].parse().map_err(|_| MessageNameError::NotNumeric {
            name: name.to_string(),
            field: "unique",
        })?;
        let job_id = fields[3]
            .parse()
            .map(JobId::new)
            .map_err(|_| MessageNameError::NotNumeric {
                name: name.to_string(),
                field: "job_id",
            })?;
        Ok(Self {
            priority,
            creation_time,
            unique,
            job_id,
        })
    }

    pub fn render(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.priority, self.creation_time, self.unique, self.job_id
        )
    }
}

impl std::fmt::Display for MessageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Numeric ordering key (spec §3 "Queue buffer entry", §4.3): priority
/// first (higher priority char ⇒ smaller key, since lower ASCII sorts
/// first), then creation time, then unique number.
///
/// Mirrors `msg_number = (priority − '/') × (creation_time × 10000 +
/// unique)`: `'/'` (0x2F) is the character immediately below the lowest
/// valid priority digit `'0'`, so `priority - '/'` is always >= 1 and
/// strictly increases as priority characters increase — i.e. *higher*
/// priority characters (numerically larger, like `'9'`) produce a
/// *larger* weight, which the scheduler treats as *lower* urgency. The FD
/// convention is that `'A'`/lower ASCII letters are highest priority, so
/// this key is combined with the standard ascending sort to give highest
/// priority first.
pub fn msg_number(priority: char, creation_time: u64, unique: u64) -> u64 {
    let weight = (priority as u64).saturating_sub('/' as u64);
    weight.saturating_mul(creation_time.saturating_mul(10_000).saturating_add(unique))
}

#[cfg(test)]
#[path = "msgname_tests.rs"]
mod tests;
