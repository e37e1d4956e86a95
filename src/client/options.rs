//! Client configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use socketio_legacy::ClientOptions;
//!
//! let options = ClientOptions::new()
//!     .with_handshake_timeout(Duration::from_secs(10))
//!     .with_registry_capacity(8);
//!
//! assert_eq!(options.registry_capacity, 8);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};
use crate::protocol::frame::MAX_PAYLOAD;

// ============================================================================
// Constants
// ============================================================================

/// Deadline for the first byte of each HTTP response (30s per protocol).
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause between closing the handshake socket and opening the upgrade one.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// How long a line read waits for more bytes.
pub const DEFAULT_LINE_GRACE: Duration = Duration::from_millis(250);

/// `Origin` header of the handshake request.
pub const DEFAULT_ORIGIN: &str = "Arduino";

/// `Origin` header of the upgrade request.
pub const DEFAULT_UPGRADE_ORIGIN: &str = "ArduinoSocketIOClient";

/// Fixed `Sec-WebSocket-Key`.
pub const DEFAULT_WEBSOCKET_KEY: &str = "x3JJHMbDL1EzLkh9GBhXDw==";

/// Handler slots.
pub const DEFAULT_REGISTRY_CAPACITY: usize = 20;

/// Session id buffer, terminator slot included.
pub const DEFAULT_MAX_SID_LEN: usize = 24;

// ============================================================================
// ClientOptions
// ============================================================================

/// Tunables for the handshake, the codec and the handler registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Deadline for the first byte of each HTTP response.
    pub handshake_timeout: Duration,

    /// Pause before reconnecting for the WebSocket upgrade.
    pub reconnect_delay: Duration,

    /// Grace wait for the rest of an HTTP line.
    pub line_grace: Duration,

    /// `Origin` header of the handshake request.
    pub origin: String,

    /// `Origin` header of the upgrade request.
    pub upgrade_origin: String,

    /// `Sec-WebSocket-Key` header value.
    pub websocket_key: String,

    /// Maximum number of event handlers.
    pub registry_capacity: usize,

    /// Session id capacity, one slot reserved for the terminator.
    pub max_sid_len: usize,

    /// Largest line or frame payload kept in the read buffer.
    pub max_unit_len: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options with protocol defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            line_grace: DEFAULT_LINE_GRACE,
            origin: DEFAULT_ORIGIN.to_owned(),
            upgrade_origin: DEFAULT_UPGRADE_ORIGIN.to_owned(),
            websocket_key: DEFAULT_WEBSOCKET_KEY.to_owned(),
            registry_capacity: DEFAULT_REGISTRY_CAPACITY,
            max_sid_len: DEFAULT_MAX_SID_LEN,
            max_unit_len: MAX_PAYLOAD,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Sets the HTTP response deadline.
    #[inline]
    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Sets the pause before the upgrade connection.
    #[inline]
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the line grace wait.
    #[inline]
    #[must_use]
    pub fn with_line_grace(mut self, grace: Duration) -> Self {
        self.line_grace = grace;
        self
    }

    /// Sets the handshake `Origin` header.
    #[inline]
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Sets the upgrade `Origin` header.
    #[inline]
    #[must_use]
    pub fn with_upgrade_origin(mut self, origin: impl Into<String>) -> Self {
        self.upgrade_origin = origin.into();
        self
    }

    /// Sets the handler registry capacity.
    #[inline]
    #[must_use]
    pub fn with_registry_capacity(mut self, capacity: usize) -> Self {
        self.registry_capacity = capacity;
        self
    }

    /// Sets the session id capacity.
    #[inline]
    #[must_use]
    pub fn with_max_sid_len(mut self, len: usize) -> Self {
        self.max_sid_len = len;
        self
    }

    /// Sets the read buffer bound.
    #[inline]
    #[must_use]
    pub fn with_max_unit_len(mut self, len: usize) -> Self {
        self.max_unit_len = len;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientOptions {
    /// Checks the options for values the client cannot work with.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.registry_capacity == 0 {
            return Err(Error::config("registry_capacity must be at least 1"));
        }
        if self.max_sid_len < 2 {
            return Err(Error::config("max_sid_len must leave room for one character"));
        }
        if self.max_unit_len == 0 {
            return Err(Error::config("max_unit_len must be non-zero"));
        }
        if self.origin.is_empty() || self.upgrade_origin.is_empty() {
            return Err(Error::config("origin headers must not be empty"));
        }
        if self.websocket_key.is_empty() {
            return Err(Error::config("websocket_key must not be empty"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
