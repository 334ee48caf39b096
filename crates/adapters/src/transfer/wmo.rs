// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WMO worker (spec §4.6 "WMO worker specifics"): frames each file with
//! an 8-byte length prefix and 2-byte message type (`BI`/`AN`/`FX`), an
//! optional SOH-prefixed sequence-counter header for environments that
//! require it, and an optional 10-byte acknowledgement
//! (`00000000AK`/`00000000NA`) the sender waits for before moving on.

use super::{ConnectTarget, FileTransferRequest, ProgressFn, TransferAdapter, TransferError, TransferOutcome};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const DEFAULT_PORT: u16 = 9000;
const ACK: &[u8; 10] = b"00000000AK";
const NAK: &[u8; 10] = b"00000000NA";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Bulletin,
    Announcement,
    Facsimile,
}

impl MessageType {
    fn code(self) -> &'static [u8; 2] {
        match self {
            MessageType::Bulletin => b"BI",
            MessageType::Announcement => b"AN",
            MessageType::Facsimile => b"FX",
        }
    }
}

pub struct WmoAdapter {
    stream: Option<TcpStream>,
    message_type: MessageType,
    use_soh_header: bool,
    wait_for_ack: bool,
    sequence_counter_path: Option<PathBuf>,
}

impl WmoAdapter {
    pub fn new(message_type: MessageType) -> Self {
        Self {
            stream: None,
            message_type,
            use_soh_header: false,
            wait_for_ack: true,
            sequence_counter_path: None,
        }
    }

    pub fn with_soh_header(mut self, sequence_counter_path: PathBuf) -> Self {
        self.use_soh_header = true;
        self.sequence_counter_path = Some(sequence_counter_path);
        self
    }

    pub fn without_ack(mut self) -> Self {
        self.wait_for_ack = false;
        self
    }

    fn next_sequence(&self) -> Result<u32, TransferError> {
        let path = self
            .sequence_counter_path
            .as_ref()
            .ok_or_else(|| TransferError::WriteRemote("no sequence counter file configured".to_string()))?;
        let current = std::fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(0);
        let next = current.wrapping_add(1);
        std::fs::write(path, next.to_string()).map_err(|e| TransferError::WriteRemote(e.to_string()))?;
        Ok(next)
    }
}

#[async_trait]
impl TransferAdapter for WmoAdapter {
    async fn connect(&mut self, target: &ConnectTarget) -> Result<(), TransferError> {
        let addr = format!("{}:{}", target.host, target.port.unwrap_or(DEFAULT_PORT));
        let stream = timeout(target.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| TransferError::Timeout(format!("connect to {addr}")))?
            .map_err(|e| TransferError::Connect(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn send_file(
        &mut self,
        request: &FileTransferRequest,
        progress: &mut ProgressFn<'_>,
    ) -> Result<TransferOutcome, TransferError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| TransferError::Connect("not connected".to_string()))?;

        let payload = tokio::fs::read(&request.local_path).await?;

        let mut header = Vec::new();
        if self.use_soh_header {
            let seq = self.next_sequence()?;
            header.push(0x01); // SOH
            header.extend_from_slice(format!("{seq:03}\r\r\n").as_bytes());
        }

        let length_field = format!("{:08}", payload.len());
        let mut frame = Vec::with_capacity(header.len() + 8 + 2 + payload.len());
        frame.extend_from_slice(&header);
        frame.extend_from_slice(length_field.as_bytes());
        frame.extend_from_slice(self.message_type.code());
        frame.extend_from_slice(&payload);

        stream
            .write_all(&frame)
            .await
            .map_err(|e| TransferError::WriteRemote(e.to_string()))?;
        progress(payload.len() as u64);

        if self.wait_for_ack {
            let mut ack = [0u8; 10];
            timeout(request_timeout(), stream.read_exact(&mut ack))
                .await
                .map_err(|_| TransferError::Timeout("waiting for WMO ack".to_string()))?
                .map_err(|e| TransferError::WriteRemote(e.to_string()))?;
            if &ack == NAK {
                return Err(TransferError::WriteRemote("remote returned NAK".to_string()));
            }
            if &ack != ACK {
                return Err(TransferError::WriteRemote(format!(
                    "unrecognised ack frame {:?}",
                    String::from_utf8_lossy(&ack)
                )));
            }
        }

        Ok(TransferOutcome {
            bytes_sent: payload.len() as u64,
        })
    }

    async fn close(&mut self) -> Result<(), TransferError> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        Ok(())
    }

    fn supports_burst(&self) -> bool {
        true
    }

    fn supports_append(&self) -> bool {
        true
    }
}

fn request_timeout() -> tokio::time::Duration {
    tokio::time::Duration::from_secs(30)
}

#[cfg(test)]
#[path = "wmo_tests.rs"]
mod tests;
