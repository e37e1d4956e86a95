//! Scripted in-memory transport for unit tests.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::Transport;

// ============================================================================
// MockTransport
// ============================================================================

/// Replays one inbound script per accepted connection and records writes.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    /// Scripts for upcoming connects. `None` refuses the connection.
    scripts: VecDeque<Option<Vec<u8>>>,
    /// Bytes left to read on the current connection.
    inbound: VecDeque<u8>,
    is_connected: bool,
    /// Every `connect` call, accepted or not.
    pub(crate) attempts: Vec<(String, u16)>,
    /// Bytes written, one entry per accepted connection.
    pub(crate) writes: Vec<Vec<u8>>,
    pub(crate) stops: usize,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Next connect succeeds and the server sends `inbound`.
    pub(crate) fn accept(mut self, inbound: impl Into<Vec<u8>>) -> Self {
        self.scripts.push_back(Some(inbound.into()));
        self
    }

    /// Next connect is refused.
    pub(crate) fn refuse(mut self) -> Self {
        self.scripts.push_back(None);
        self
    }

    /// Starts out connected with `inbound` pending, as after an upgrade.
    pub(crate) fn attached(inbound: impl Into<Vec<u8>>) -> Self {
        Self {
            inbound: inbound.into().into(),
            is_connected: true,
            writes: vec![Vec::new()],
            ..Self::default()
        }
    }

    /// Appends bytes to the current connection.
    pub(crate) fn feed(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes);
    }

    /// Simulates the peer dropping the connection.
    pub(crate) fn hang_up(&mut self) {
        self.is_connected = false;
        self.inbound.clear();
    }

    /// Bytes written on the `index`-th accepted connection.
    pub(crate) fn written(&self, index: usize) -> &[u8] {
        self.writes.get(index).map(Vec::as_slice).unwrap_or_default()
    }

    /// Bytes written on the most recent connection.
    pub(crate) fn last_written(&self) -> &[u8] {
        self.writes.last().map(Vec::as_slice).unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        self.attempts.push((host.to_owned(), port));
        match self.scripts.pop_front() {
            Some(Some(inbound)) => {
                self.inbound = inbound.into();
                self.is_connected = true;
                self.writes.push(Vec::new());
                Ok(())
            }
            _ => Err(Error::connection(format!("{host}:{port}: refused"))),
        }
    }

    fn connected(&self) -> bool {
        self.is_connected
    }

    fn available(&mut self) -> Result<usize> {
        Ok(if self.is_connected {
            self.inbound.len()
        } else {
            0
        })
    }

    async fn wait_for_data(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(self.is_connected && !self.inbound.is_empty())
    }

    async fn read_byte(&mut self) -> Result<u8> {
        self.inbound.pop_front().ok_or(Error::ConnectionClosed)
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.is_connected {
            return Err(Error::ConnectionClosed);
        }
        if let Some(current) = self.writes.last_mut() {
            current.extend_from_slice(bytes);
        }
        Ok(())
    }

    async fn stop(&mut self) {
        self.is_connected = false;
        self.inbound.clear();
        self.stops += 1;
    }
}
