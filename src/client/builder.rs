//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`Client`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use socketio_legacy::Client;
//!
//! # fn example() -> socketio_legacy::Result<()> {
//! let client = Client::builder()
//!     .origin("greenhouse-node")
//!     .handshake_timeout(Duration::from_secs(10))
//!     .registry_capacity(8)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::Result;
use crate::transport::{TcpTransport, Transport};

use super::core::Client;
use super::options::ClientOptions;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`Client`] instance.
///
/// Use [`Client::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct ClientBuilder {
    options: ClientOptions,
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a builder with protocol defaults.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the deadline for the first byte of each HTTP response.
    #[inline]
    #[must_use]
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.options.handshake_timeout = timeout;
        self
    }

    /// Sets the pause between the handshake and the upgrade connection.
    #[inline]
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.options.reconnect_delay = delay;
        self
    }

    /// Sets how long a line read waits for trailing bytes.
    #[inline]
    #[must_use]
    pub fn line_grace(mut self, grace: Duration) -> Self {
        self.options.line_grace = grace;
        self
    }

    /// Sets the `Origin` header of the handshake request.
    #[inline]
    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.options.origin = origin.into();
        self
    }

    /// Sets the `Origin` header of the upgrade request.
    #[inline]
    #[must_use]
    pub fn upgrade_origin(mut self, origin: impl Into<String>) -> Self {
        self.options.upgrade_origin = origin.into();
        self
    }

    /// Sets the maximum number of event handlers.
    #[inline]
    #[must_use]
    pub fn registry_capacity(mut self, capacity: usize) -> Self {
        self.options.registry_capacity = capacity;
        self
    }

    /// Builds a client over a fresh [`TcpTransport`].
    ///
    /// # Errors
    ///
    /// [`Error::Config`](crate::Error::Config) if the options are invalid.
    pub fn build(self) -> Result<Client<TcpTransport>> {
        self.build_with(TcpTransport::new())
    }

    /// Builds a client over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// [`Error::Config`](crate::Error::Config) if the options are invalid.
    pub fn build_with<T: Transport>(self, transport: T) -> Result<Client<T>> {
        Client::with_transport(transport, self.options)
    }
}

// ============================================================================
// Tests
// ============================================================================
