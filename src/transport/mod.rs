//! Byte-stream transport layer.
//!
//! The client never touches sockets directly. Everything it needs from the
//! network goes through the [`Transport`] trait, which mirrors the small
//! surface of an embedded TCP client: connect, poll for buffered bytes, read
//! one byte, write, stop.
//!
//! # Connection Lifecycle
//!
//! 1. `Transport::connect` - HTTP handshake connection
//! 2. `Transport::stop` - server closes after the handshake body
//! 3. `Transport::connect` - fresh connection for the WebSocket upgrade
//! 4. `Transport::available` / `Transport::read_byte` - frame polling
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `tcp` | [`TcpTransport`] over `tokio::net::TcpStream` |

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// Tokio TCP transport.
pub mod tcp;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use tcp::TcpTransport;

// ============================================================================
// Transport
// ============================================================================

/// Byte-stream collaborator used by the handshake and the dispatcher.
///
/// Implementations own the socket and whatever read-ahead buffer they need.
/// Only one read is ever in flight.
#[async_trait]
pub trait Transport: Send {
    /// Opens a connection to `host:port`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// [`Error::Connection`](crate::Error::Connection) if the peer is unreachable.
    async fn connect(&mut self, host: &str, port: u16) -> Result<()>;

    /// Returns `true` while the connection is open or unread bytes remain.
    fn connected(&self) -> bool;

    /// Returns the number of bytes readable without waiting.
    fn available(&mut self) -> Result<usize>;

    /// Waits up to `timeout` for at least one readable byte.
    ///
    /// Returns `false` on timeout or end of stream.
    async fn wait_for_data(&mut self, timeout: Duration) -> Result<bool>;

    /// Reads a single byte, waiting for it if necessary.
    ///
    /// # Errors
    ///
    /// [`Error::ConnectionClosed`](crate::Error::ConnectionClosed) at end of stream.
    async fn read_byte(&mut self) -> Result<u8>;

    /// Writes all of `bytes`.
    async fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Closes the connection and drops buffered input.
    async fn stop(&mut self);
}
