// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local worker (spec §4.6 "Local worker specifics"): no network session
//! at all, just a link-or-copy into the destination directory plus
//! whatever lock regime the job's options asked for.

use super::{ConnectTarget, FileTransferRequest, ProgressFn, TransferAdapter, TransferError, TransferOutcome};
use afd_shell::LockRegime;
use async_trait::async_trait;
use std::path::PathBuf;

pub struct LocAdapter {
    target_dir: Option<PathBuf>,
    lock_regime: Option<LockRegime>,
}

impl Default for LocAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LocAdapter {
    pub fn new() -> Self {
        Self {
            target_dir: None,
            lock_regime: None,
        }
    }

    pub fn with_lock_regime(mut self, regime: LockRegime) -> Self {
        self.lock_regime = Some(regime);
        self
    }
}

#[async_trait]
impl TransferAdapter for LocAdapter {
    async fn connect(&mut self, target: &ConnectTarget) -> Result<(), TransferError> {
        self.target_dir = Some(PathBuf::from(&target.host));
        Ok(())
    }

    async fn send_file(
        &mut self,
        request: &FileTransferRequest,
        progress: &mut ProgressFn<'_>,
    ) -> Result<TransferOutcome, TransferError> {
        let dir = self
            .target_dir
            .as_ref()
            .ok_or_else(|| TransferError::Connect("not connected".to_string()))?;

        let final_name = match self.lock_regime {
            Some(regime) => afd_shell::apply_lock_name(regime, &request.remote_name),
            None => request.remote_name.clone(),
        };
        let dst = dir.join(&final_name);

        afd_shell::link_or_copy(&request.local_path, &dst)
            .map_err(|e| TransferError::WriteRemote(e.to_string()))?;

        if let Some(regime) = self.lock_regime {
            let renamed = afd_shell::final_name(regime, &final_name);
            let renamed_path = dir.join(&renamed);
            std::fs::rename(&dst, &renamed_path).map_err(|e| TransferError::MoveRemote(e.to_string()))?;
        }

        progress(request.size);
        Ok(TransferOutcome {
            bytes_sent: request.size,
        })
    }

    async fn close(&mut self) -> Result<(), TransferError> {
        Ok(())
    }

    fn supports_burst(&self) -> bool {
        false
    }

    fn supports_append(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "loc_tests.rs"]
mod tests;
