//! Connection endpoint.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 80;

/// Default resource path segment.
pub const DEFAULT_RESOURCE: &str = "socket.io";

/// Root namespace.
pub const ROOT_NAMESPACE: &str = "/";

// ============================================================================
// Endpoint
// ============================================================================

/// Where to connect: `{host, port, resource, namespace}`.
///
/// Fixed for the lifetime of a connection attempt.
///
/// # Example
///
/// ```
/// use socketio_legacy::Endpoint;
///
/// let endpoint = Endpoint::new("192.168.0.10", 3000).with_namespace("/chat_room");
/// assert_eq!(endpoint.resource(), "socket.io");
/// assert!(!endpoint.is_root_namespace());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    resource: String,
    namespace: String,
}

impl Endpoint {
    /// Creates an endpoint with the default resource and root namespace.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            resource: DEFAULT_RESOURCE.to_owned(),
            namespace: ROOT_NAMESPACE.to_owned(),
        }
    }

    /// Parses `http://host[:port][/resource]`.
    ///
    /// `ws://` is accepted as a synonym. Secure schemes are rejected.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] for an unparsable URL, a TLS scheme or a missing host.
    pub fn parse(url: &str) -> Result<Self> {
        let parsed =
            Url::parse(url).map_err(|e| Error::config(format!("invalid URL {url:?}: {e}")))?;

        match parsed.scheme() {
            "http" | "ws" => {}
            "https" | "wss" => {
                return Err(Error::config(format!("TLS is not supported: {url}")));
            }
            other => return Err(Error::config(format!("unsupported scheme {other:?}"))),
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| Error::config(format!("missing host in {url:?}")))?;
        let port = parsed.port_or_known_default().unwrap_or(DEFAULT_PORT);

        let mut endpoint = Self::new(host, port);
        let resource = parsed.path().trim_matches('/');
        if !resource.is_empty() {
            endpoint.resource = resource.to_owned();
        }
        Ok(endpoint)
    }

    /// Sets the resource path segment (default `socket.io`).
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        let resource = resource.into();
        self.resource = resource.trim_matches('/').to_owned();
        self
    }

    /// Sets the namespace to join after the upgrade (default `/`).
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = if namespace.is_empty() {
            ROOT_NAMESPACE.to_owned()
        } else {
            namespace
        };
        self
    }

    /// Host name or address.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Resource path segment.
    #[inline]
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Namespace.
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns `true` for the default `/` namespace.
    #[inline]
    #[must_use]
    pub fn is_root_namespace(&self) -> bool {
        self.namespace == ROOT_NAMESPACE
    }

    /// Packet endpoint field: empty for the root namespace.
    #[inline]
    #[must_use]
    pub fn packet_endpoint(&self) -> &str {
        if self.is_root_namespace() {
            ""
        } else {
            &self.namespace
        }
    }

    /// Value of the `Host` header.
    #[must_use]
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "http://{}:{}/{} ({})",
            self.host, self.port, self.resource, self.namespace
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
