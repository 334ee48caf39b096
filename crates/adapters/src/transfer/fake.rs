// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake transfer adapter for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ConnectTarget, FileTransferRequest, ProgressFn, TransferAdapter, TransferError, TransferOutcome};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded call to [`FakeTransferAdapter`].
#[derive(Debug, Clone)]
pub enum TransferCall {
    Connect { host: String },
    SendFile { remote_name: String, size: u64 },
    Close,
}

/// Fake transfer adapter for testing the scheduler and worker runtime
/// without a real FTP/SMTP/WMO/local/MAP session.
///
/// Allows programmatic control over connect/send_file/close behavior and
/// records all calls.
#[derive(Clone)]
pub struct FakeTransferAdapter {
    inner: Arc<Mutex<FakeState>>,
}

struct FakeState {
    calls: Vec<TransferCall>,
    connect_error: Option<TransferError>,
    send_error: Option<TransferError>,
    burst: bool,
    append: bool,
    connected: bool,
}

impl Default for FakeTransferAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTransferAdapter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                calls: Vec::new(),
                connect_error: None,
                send_error: None,
                burst: false,
                append: false,
                connected: false,
            })),
        }
    }

    pub fn with_capabilities(burst: bool, append: bool) -> Self {
        let adapter = Self::new();
        {
            let mut inner = adapter.inner.lock();
            inner.burst = burst;
            inner.append = append;
        }
        adapter
    }

    pub fn calls(&self) -> Vec<TransferCall> {
        self.inner.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    pub fn set_connect_error(&self, error: TransferError) {
        self.inner.lock().connect_error = Some(error);
    }

    pub fn set_send_error(&self, error: TransferError) {
        self.inner.lock().send_error = Some(error);
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }
}

#[async_trait]
impl TransferAdapter for FakeTransferAdapter {
    async fn connect(&mut self, target: &ConnectTarget) -> Result<(), TransferError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TransferCall::Connect {
            host: target.host.clone(),
        });
        if let Some(error) = inner.connect_error.take() {
            return Err(error);
        }
        inner.connected = true;
        Ok(())
    }

    async fn send_file(
        &mut self,
        request: &FileTransferRequest,
        progress: &mut ProgressFn<'_>,
    ) -> Result<TransferOutcome, TransferError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TransferCall::SendFile {
            remote_name: request.remote_name.clone(),
            size: request.size,
        });
        if let Some(error) = inner.send_error.take() {
            return Err(error);
        }
        if !inner.connected {
            return Err(TransferError::Connect("not connected".to_string()));
        }
        drop(inner);
        progress(request.size);
        Ok(TransferOutcome {
            bytes_sent: request.size,
        })
    }

    async fn close(&mut self) -> Result<(), TransferError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TransferCall::Close);
        inner.connected = false;
        Ok(())
    }

    fn supports_burst(&self) -> bool {
        self.inner.lock().burst
    }

    fn supports_append(&self) -> bool {
        self.inner.lock().append
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
