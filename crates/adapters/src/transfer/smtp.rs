// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SMTP worker (spec §4.6 "SMTP worker specifics"): drives the RFC 821
//! HELO/MAIL FROM/RCPT TO/DATA/QUIT sequence, base64-encoding the file as
//! a MIME attachment under a per-message boundary. The CP-437-to-Latin-1
//! transliteration table covers the handful of box-drawing and
//! accented-letter codepoints the original host charset produced in
//! subject lines; it is not a general codec.

use super::{ConnectTarget, FileTransferRequest, ProgressFn, TransferAdapter, TransferError, TransferOutcome};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

const DEFAULT_PORT: u16 = 25;

/// Transliterates the handful of accented letters the legacy sender's
/// CP-437 locale produced in subject lines into a plain ASCII fallback,
/// since the wire format here is 7-bit SMTP headers rather than
/// MIME-encoded-word subjects. Anything not in the table passes through.
fn cp437_to_latin1(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\u{00E9}' | '\u{00E8}' | '\u{00EA}' => 'e', // é è ê
            '\u{00E0}' | '\u{00E2}' => 'a',               // à â
            '\u{00FC}' | '\u{00F6}' | '\u{00E4}' => match c {
                '\u{00FC}' => 'u',
                '\u{00F6}' => 'o',
                _ => 'a',
            },
            '\u{00E7}' => 'c', // ç
            other => other,
        })
        .collect()
}

fn base64_encode(data: &[u8]) -> String {
    const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);
    for chunk in data.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = *chunk.get(1).unwrap_or(&0) as u32;
        let b2 = *chunk.get(2).unwrap_or(&0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;
        out.push(ALPHABET[((triple >> 18) & 0x3f) as usize] as char);
        out.push(ALPHABET[((triple >> 12) & 0x3f) as usize] as char);
        out.push(if chunk.len() > 1 {
            ALPHABET[((triple >> 6) & 0x3f) as usize] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            ALPHABET[(triple & 0x3f) as usize] as char
        } else {
            '='
        });
    }
    out
}

pub struct SmtpAdapter {
    stream: Option<BufReader<TcpStream>>,
    from: String,
    subject: String,
}

impl SmtpAdapter {
    pub fn new(from: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            stream: None,
            from: from.into(),
            subject: cp437_to_latin1(&subject.into()),
        }
    }

    async fn read_reply(stream: &mut BufReader<TcpStream>) -> Result<(u16, String), TransferError> {
        let mut line = String::new();
        stream
            .read_line(&mut line)
            .await
            .map_err(|e| TransferError::Connect(e.to_string()))?;
        let code: u16 = line
            .get(0..3)
            .and_then(|c| c.parse().ok())
            .ok_or_else(|| TransferError::Connect(format!("malformed reply {line:?}")))?;
        Ok((code, line))
    }

    async fn command(stream: &mut BufReader<TcpStream>, line: &str) -> Result<(u16, String), TransferError> {
        stream
            .get_mut()
            .write_all(format!("{line}\r\n").as_bytes())
            .await
            .map_err(|e| TransferError::WriteRemote(e.to_string()))?;
        Self::read_reply(stream).await
    }
}

#[async_trait]
impl TransferAdapter for SmtpAdapter {
    async fn connect(&mut self, target: &ConnectTarget) -> Result<(), TransferError> {
        let addr = format!("{}:{}", target.host, target.port.unwrap_or(DEFAULT_PORT));
        let tcp = timeout(target.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| TransferError::Timeout(format!("connect to {addr}")))?
            .map_err(|e| TransferError::Connect(e.to_string()))?;
        let mut stream = BufReader::new(tcp);
        let (code, greeting) = Self::read_reply(&mut stream).await?;
        if code != 220 {
            return Err(TransferError::Connect(format!("unexpected greeting {greeting:?}")));
        }
        let (code, resp) = Self::command(&mut stream, "HELO afd").await?;
        if code != 250 {
            return Err(TransferError::Connect(resp));
        }
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

        let (code, resp) = Self::command(stream, &format!("MAIL FROM:<{}>", self.from)).await?;
        if code != 250 {
            return Err(TransferError::User(resp));
        }
        let (code, resp) = Self::command(stream, &format!("RCPT TO:<{}>", request.remote_name)).await?;
        if code != 250 && code != 251 {
            return Err(TransferError::User(resp));
        }
        let (code, resp) = Self::command(stream, "DATA").await?;
        if code != 354 {
            return Err(TransferError::OpenRemote(resp));
        }

        let mut file_bytes = Vec::new();
        tokio::fs::File::open(&request.local_path)
            .await?
            .read_to_end(&mut file_bytes)
            .await?;
        let encoded = base64_encode(&file_bytes);

        let boundary = format!("----{}", request.remote_name.replace(['.', '/'], "_"));
        let mut body = String::new();
        body.push_str(&format!("Subject: {}\r\n", self.subject));
        body.push_str("MIME-Version: 1.0\r\n");
        body.push_str(&format!(
            "Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\r\n"
        ));
        body.push_str(&format!("--{boundary}\r\n"));
        body.push_str(&format!(
            "Content-Type: application/octet-stream; name=\"{}\"\r\n",
            request.remote_name
        ));
        body.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
        body.push_str(&encoded);
        body.push_str(&format!("\r\n--{boundary}--\r\n.\r\n"));

        stream
            .get_mut()
            .write_all(body.as_bytes())
            .await
            .map_err(|e| TransferError::WriteRemote(e.to_string()))?;
        progress(file_bytes.len() as u64);

        let (code, resp) = Self::read_reply(stream).await?;
        if code != 250 {
            return Err(TransferError::WriteRemote(resp));
        }

        Ok(TransferOutcome {
            bytes_sent: file_bytes.len() as u64,
        })
    }

    async fn close(&mut self) -> Result<(), TransferError> {
        if let Some(mut stream) = self.stream.take() {
            let _ = Self::command(&mut stream, "QUIT").await;
        }
        Ok(())
    }

    fn supports_burst(&self) -> bool {
        false
    }

    fn supports_append(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "smtp_tests.rs"]
mod tests;
