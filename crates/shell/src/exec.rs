// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-transfer command execution: the `post-exec`/`site` option's
//! command line, run once per file after a successful transfer (spec
//! §4.6 step 4).

use std::path::Path;
use std::process::Output;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("empty command line")]
    EmptyCommand,
    #[error("unterminated quote in command line {0:?}")]
    UnterminatedQuote(String),
    #[error("failed to spawn {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl From<Output> for ExecOutput {
    fn from(output: Output) -> Self {
        Self {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Splits a command line into words, honouring double-quoted segments
/// (so a filename with spaces can be passed as one argument). This is
/// intentionally not a full shell grammar — `post-exec`/`site` command
/// lines are a single external command invocation, never a pipeline or
/// control-flow construct (spec §4.6, §9 "no further protocol grammar").
fn split_command_line(line: &str) -> Result<Vec<String>, ExecError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    let mut has_current = false;

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_current = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_current {
                    words.push(std::mem::take(&mut current));
                    has_current = false;
                }
            }
            '\\' if in_quotes => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                has_current = true;
            }
            c => {
                current.push(c);
                has_current = true;
            }
        }
    }
    if in_quotes {
        return Err(ExecError::UnterminatedQuote(line.to_string()));
    }
    if has_current {
        words.push(current);
    }
    Ok(words)
}

/// Runs a post-exec/`site` command line with `cwd` as the working
/// directory and `filename` substituted for any literal `{}` token (the
/// convention the spec's `site <cmd>` option follows for naming the
/// just-transferred file).
pub async fn run_post_exec(
    command_line: &str,
    cwd: &Path,
    filename: &str,
) -> Result<ExecOutput, ExecError> {
    let words = split_command_line(command_line)?;
    let mut words = words.into_iter();
    let program = words.next().ok_or(ExecError::EmptyCommand)?;
    let args: Vec<String> = words.map(|w| if w == "{}" { filename.to_string() } else { w }).collect();

    let output = Command::new(&program)
        .args(&args)
        .current_dir(cwd)
        .output()
        .await
        .map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;
    Ok(output.into())
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
