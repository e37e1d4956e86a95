//! Error types for the Socket.IO client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use socketio_legacy::{Client, Endpoint, Result};
//!
//! async fn example(client: &mut Client) -> Result<()> {
//!     client.connect(Endpoint::new("localhost", 3000)).await?;
//!     client.emit("chat_message", "hello").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Transport | [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::Io`] |
//! | Timeout | [`Error::ConnectionTimeout`] |
//! | Protocol | [`Error::UnexpectedStatus`], [`Error::Protocol`], [`Error::Frame`], [`Error::FrameTooLarge`], [`Error::Json`] |
//! | Capacity | [`Error::RegistryFull`] |
//! | Configuration | [`Error::Config`], [`Error::NotConnected`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client options or an endpoint are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Operation requires an established session.
    #[error("Not connected")]
    NotConnected,

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// TCP connection failed.
    ///
    /// Returned when the transport cannot reach the server.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection closed while reading or writing.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Timeout Errors
    // ========================================================================
    /// Server did not answer within the handshake deadline.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// HTTP status line carried an unexpected code.
    #[error("Unexpected HTTP status {actual} (expected {expected})")]
    UnexpectedStatus {
        /// Status code the handshake phase requires.
        expected: u16,
        /// Status code the server answered with.
        actual: u16,
    },

    /// Protocol violation or unexpected response.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Inbound WebSocket frame the codec does not support.
    ///
    /// Binary, control, masked and fragmented frames land here.
    #[error("Frame error: {message}")]
    Frame {
        /// Description of the offending frame.
        message: String,
    },

    /// Outgoing payload exceeds the 16-bit frame length.
    #[error("Frame too large: {len} bytes (max {max})")]
    FrameTooLarge {
        /// Payload length in bytes.
        len: usize,
        /// Largest encodable payload.
        max: usize,
    },

    // ========================================================================
    // Capacity Errors
    // ========================================================================
    /// Handler registry has no free slot.
    #[error("Handler registry full ({capacity} handlers)")]
    RegistryFull {
        /// Configured registry capacity.
        capacity: usize,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// ErrorKind
// ============================================================================

/// Coarse failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connect refused, connection dropped, socket I/O failure.
    Transport,
    /// No response within the deadline.
    Timeout,
    /// Unexpected status, malformed or unsupported frame, bad payload.
    Protocol,
    /// A bounded resource is exhausted.
    Capacity,
    /// Invalid configuration or misuse of the API.
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::Protocol => "protocol",
            Self::Capacity => "capacity",
            Self::Config => "config",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates an unexpected status error.
    #[inline]
    pub fn unexpected_status(expected: u16, actual: u16) -> Self {
        Self::UnexpectedStatus { expected, actual }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a frame decode error.
    #[inline]
    pub fn frame(message: impl Into<String>) -> Self {
        Self::Frame {
            message: message.into(),
        }
    }

    /// Creates a frame too large error.
    #[inline]
    pub fn frame_too_large(len: usize, max: usize) -> Self {
        Self::FrameTooLarge { len, max }
    }

    /// Creates a registry full error.
    #[inline]
    pub fn registry_full(capacity: usize) -> Self {
        Self::RegistryFull { capacity }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns the taxonomy bucket of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } | Self::ConnectionClosed | Self::Io(_) => ErrorKind::Transport,
            Self::ConnectionTimeout { .. } => ErrorKind::Timeout,
            Self::UnexpectedStatus { .. }
            | Self::Protocol { .. }
            | Self::Frame { .. }
            | Self::FrameTooLarge { .. }
            | Self::Json(_) => ErrorKind::Protocol,
            Self::RegistryFull { .. } => ErrorKind::Capacity,
            Self::Config { .. } | Self::NotConnected => ErrorKind::Config,
        }
    }

    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }

    /// Returns `true` if this is a transport error.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// Returns `true` if this is a protocol error.
    ///
    /// Protocol errors on inbound frames drop the frame, never the session.
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        self.kind() == ErrorKind::Protocol
    }

    /// Returns `true` if this is a capacity error.
    #[inline]
    #[must_use]
    pub fn is_capacity_error(&self) -> bool {
        self.kind() == ErrorKind::Capacity
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind as IoErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("refused");
        assert_eq!(err.to_string(), "Connection failed: refused");

        let err = Error::unexpected_status(101, 400);
        assert_eq!(err.to_string(), "Unexpected HTTP status 400 (expected 101)");
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Error::ConnectionClosed.kind(), ErrorKind::Transport);
        assert_eq!(Error::connection_timeout(30_000).kind(), ErrorKind::Timeout);
        assert_eq!(Error::frame("binary").kind(), ErrorKind::Protocol);
        assert_eq!(Error::frame_too_large(70_000, 65_535).kind(), ErrorKind::Protocol);
        assert_eq!(Error::registry_full(20).kind(), ErrorKind::Capacity);
        assert_eq!(Error::NotConnected.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_predicates() {
        assert!(Error::connection_timeout(1000).is_timeout());
        assert!(!Error::connection("x").is_timeout());
        assert!(Error::connection("x").is_transport_error());
        assert!(Error::unexpected_status(200, 503).is_protocol_error());
        assert!(Error::registry_full(1).is_capacity_error());
        assert!(!Error::config("x").is_protocol_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(IoErrorKind::ConnectionReset, "reset");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.is_transport_error());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.is_protocol_error());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::Capacity.to_string(), "capacity");
    }
}
