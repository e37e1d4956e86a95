//! Tokio TCP transport.
//!
//! Wraps a [`TcpStream`] with a read-ahead buffer so the protocol layer can
//! ask "how many bytes are available?" without blocking, the way an embedded
//! network stack would answer it.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::{Error, Result};

use super::Transport;

// ============================================================================
// Constants
// ============================================================================

/// Size of a single socket read.
const READ_CHUNK: usize = 4096;

// ============================================================================
// TcpTransport
// ============================================================================

/// [`Transport`] backed by a tokio TCP stream.
#[derive(Debug, Default)]
pub struct TcpTransport {
    /// Open stream, `None` when stopped.
    stream: Option<TcpStream>,
    /// Bytes received but not yet consumed.
    buffer: VecDeque<u8>,
    /// Peer closed its write half.
    eof: bool,
}

impl TcpTransport {
    /// Creates a disconnected transport.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pulls whatever the socket has ready without waiting.
    fn fill_nonblocking(&mut self) -> Result<()> {
        let Some(stream) = self.stream.as_ref() else {
            return Ok(());
        };
        if self.eof {
            return Ok(());
        }

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match stream.try_read(&mut chunk) {
                Ok(0) => {
                    trace!("Peer closed connection");
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => self.buffer.extend(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(e) => {
                    self.eof = true;
                    return Err(e.into());
                }
            }
        }
    }

    /// Waits for the next chunk. Returns `false` at end of stream.
    async fn fill_blocking(&mut self) -> Result<bool> {
        if self.eof {
            return Ok(false);
        }
        let Some(stream) = self.stream.as_mut() else {
            return Ok(false);
        };

        let mut chunk = [0u8; READ_CHUNK];
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            trace!("Peer closed connection");
            self.eof = true;
            return Ok(false);
        }
        self.buffer.extend(&chunk[..n]);
        Ok(true)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        self.stop().await;

        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| Error::connection(format!("{host}:{port}: {e}")))?;
        stream.set_nodelay(true)?;

        debug!(host, port, "TCP connection established");
        self.stream = Some(stream);
        Ok(())
    }

    fn connected(&self) -> bool {
        self.stream.is_some() && (!self.eof || !self.buffer.is_empty())
    }

    fn available(&mut self) -> Result<usize> {
        self.fill_nonblocking()?;
        Ok(self.buffer.len())
    }

    async fn wait_for_data(&mut self, wait: Duration) -> Result<bool> {
        if !self.buffer.is_empty() {
            return Ok(true);
        }
        match timeout(wait, self.fill_blocking()).await {
            Ok(result) => result,
            Err(_) => Ok(false),
        }
    }

    async fn read_byte(&mut self) -> Result<u8> {
        if self.buffer.is_empty() && !self.fill_blocking().await? {
            return Err(Error::ConnectionClosed);
        }
        self.buffer.pop_front().ok_or(Error::ConnectionClosed)
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::ConnectionClosed)?;
        stream.write_all(bytes).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
            debug!("TCP connection closed");
        }
        self.buffer.clear();
        self.eof = false;
    }
}

// ============================================================================
// Tests
// ============================================================================
