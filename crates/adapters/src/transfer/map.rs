// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MAP worker (spec §4.6 "MAP worker specifics", §9 redesign note): the
//! MAP library itself is an external collaborator outside this repo's
//! scope (spec §1), so [`MapAdapter`] is generic over an injectable
//! [`MapClient`] rather than linking a real MAP SDK. The redesign note
//! calls for replacing the original SIGALRM/`setjmp` cancellation with an
//! explicit deadline; here that is a `tokio::time::timeout` wrapped
//! around the blocking `store_blob` call instead of a signal handler.

use super::{ConnectTarget, FileTransferRequest, ProgressFn, TransferAdapter, TransferError, TransferOutcome};
use async_trait::async_trait;
use tokio::time::timeout;

/// The subset of a MAP SDK's surface this worker drives. A production
/// build would implement this against the vendor library; tests and
/// this crate's own default wiring use a fake.
#[async_trait]
pub trait MapClient: Send + Sync {
    async fn open_session(&mut self, host: &str) -> Result<(), String>;
    async fn store_blob(&mut self, name: &str, data: &[u8]) -> Result<(), String>;
    async fn close_session(&mut self) -> Result<(), String>;
}

pub struct MapAdapter<C> {
    client: C,
    store_deadline: tokio::time::Duration,
}

impl<C: MapClient> MapAdapter<C> {
    pub fn new(client: C, store_deadline: tokio::time::Duration) -> Self {
        Self {
            client,
            store_deadline,
        }
    }
}

#[async_trait]
impl<C: MapClient + Send + Sync> TransferAdapter for MapAdapter<C> {
    async fn connect(&mut self, target: &ConnectTarget) -> Result<(), TransferError> {
        timeout(target.connect_timeout, self.client.open_session(&target.host))
            .await
            .map_err(|_| TransferError::Timeout(format!("connect to {}", target.host)))?
            .map_err(TransferError::Connect)
    }

    async fn send_file(
        &mut self,
        request: &FileTransferRequest,
        progress: &mut ProgressFn<'_>,
    ) -> Result<TransferOutcome, TransferError> {
        let data = tokio::fs::read(&request.local_path).await?;
        let len = data.len() as u64;

        timeout(
            self.store_deadline,
            self.client.store_blob(&request.remote_name, &data),
        )
        .await
        .map_err(|_| TransferError::Timeout(format!("store_blob({})", request.remote_name)))?
        .map_err(TransferError::WriteRemote)?;

        progress(len);
        Ok(TransferOutcome { bytes_sent: len })
    }

    async fn close(&mut self) -> Result<(), TransferError> {
        self.client
            .close_session()
            .await
            .map_err(TransferError::WriteRemote)
    }

    fn supports_burst(&self) -> bool {
        false
    }

    fn supports_append(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "map_tests.rs"]
mod tests;
