//! Socket.IO client facade.
//!
//! # Example
//!
//! ```no_run
//! use socketio_legacy::{Client, Endpoint};
//!
//! # async fn example() -> socketio_legacy::Result<()> {
//! let mut client = Client::builder().build()?;
//!
//! client.on("chat message", |event| {
//!     println!("got {:?}", event.first_str());
//!     None
//! })?;
//!
//! client
//!     .connect(Endpoint::new("192.168.0.10", 3000).with_namespace("/chat_room"))
//!     .await?;
//!
//! loop {
//!     client.poll().await?;
//!     tokio::time::sleep(std::time::Duration::from_millis(50)).await;
//! }
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde_json::Value;
use tracing::{debug, info, trace};

use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::protocol::{Event, EventPayload, EventReply, FrameReader, Packet, encode_text_frame};
use crate::transport::{TcpTransport, Transport};

use super::builder::ClientBuilder;
use super::endpoint::Endpoint;
use super::handshake::HandshakeInfo;
use super::options::ClientOptions;
use super::registry::HandlerRegistry;

// ============================================================================
// ConnectionState
// ============================================================================

/// Progress of the connection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No session.
    Disconnected,
    /// Handshake request being sent.
    HttpHandshake,
    /// Waiting for the handshake response.
    HttpResponseWait,
    /// Session id received, handshake socket closed.
    SidExtracted,
    /// Waiting for `101 Switching Protocols`.
    WsUpgradeWait,
    /// Upgrade complete, frames flowing.
    Connected,
    /// Last connection attempt failed.
    Failed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::HttpHandshake => "http-handshake",
            Self::HttpResponseWait => "http-response-wait",
            Self::SidExtracted => "sid-extracted",
            Self::WsUpgradeWait => "ws-upgrade-wait",
            Self::Connected => "connected",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Client
// ============================================================================

/// Socket.IO v0.9 client.
///
/// Owns its transport exclusively. Every operation takes `&mut self`, so
/// there is exactly one read in flight at any time.
pub struct Client<T: Transport = TcpTransport> {
    /// Byte-stream collaborator.
    pub(crate) transport: T,
    /// Tunables.
    pub(crate) options: ClientOptions,
    /// Endpoint of the current or last connection attempt.
    pub(crate) endpoint: Option<Endpoint>,
    /// Session id from the last successful handshake.
    pub(crate) session: Option<SessionId>,
    /// Parsed handshake body.
    pub(crate) handshake: Option<HandshakeInfo>,
    /// State machine position.
    pub(crate) state: ConnectionState,
    /// Event handlers.
    pub(crate) registry: HandlerRegistry,
    /// Reusable inbound buffer.
    pub(crate) reader: FrameReader,
}

// ============================================================================
// Client - Display
// ============================================================================

impl<T: Transport> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .field("session", &self.session)
            .field("state", &self.state)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client - Construction
// ============================================================================

impl Client<TcpTransport> {
    /// Creates a configuration builder for a TCP client.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client over `transport`.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if `options` fail validation.
    pub fn with_transport(transport: T, options: ClientOptions) -> Result<Self> {
        options.validate()?;

        Ok(Self {
            transport,
            registry: HandlerRegistry::new(options.registry_capacity),
            reader: FrameReader::new(options.max_unit_len, options.line_grace),
            options,
            endpoint: None,
            session: None,
            handshake: None,
            state: ConnectionState::Disconnected,
        })
    }
}

// ============================================================================
// Client - Public API
// ============================================================================

impl<T: Transport> Client<T> {
    /// Registers `handler` for events named `name`.
    ///
    /// Registering an existing name replaces its handler.
    ///
    /// # Errors
    ///
    /// [`Error::RegistryFull`] once the registry capacity is reached.
    pub fn on<F>(&mut self, name: impl Into<String>, handler: F) -> Result<()>
    where
        F: Fn(&Event) -> Option<EventReply> + Send + Sync + 'static,
    {
        self.registry.register(name, Box::new(handler))
    }

    /// Emits `event` with a single string argument.
    ///
    /// Wire form: `5::<namespace>:{"name":"<event>","args":["<data>"]}`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] before the upgrade completes
    /// - [`Error::FrameTooLarge`] if the encoded packet exceeds 65535 bytes
    pub async fn emit(&mut self, event: &str, data: &str) -> Result<()> {
        self.emit_json(event, vec![Value::String(data.to_owned())])
            .await
    }

    /// Emits `event` with arbitrary JSON arguments.
    ///
    /// # Errors
    ///
    /// Same as [`Client::emit`].
    pub async fn emit_json(&mut self, event: &str, args: Vec<Value>) -> Result<()> {
        if self.state != ConnectionState::Connected {
            return Err(Error::NotConnected);
        }

        let payload = EventPayload {
            name: event.to_owned(),
            args,
        }
        .to_json()?;
        let packet = Packet::event(self.packet_endpoint(), payload);

        debug!(event, "Emitting event");
        self.send_packet(&packet).await
    }

    /// Leaves the namespace and closes the connection.
    ///
    /// Sends `0::<namespace>` first when connected. Handlers stay registered.
    /// [`Client::poll`] will not reopen the connection until the next
    /// [`Client::connect`].
    pub async fn disconnect(&mut self) {
        if self.state == ConnectionState::Connected {
            let packet = Packet::disconnect(self.packet_endpoint());
            if let Err(e) = self.send_packet(&packet).await {
                debug!(error = %e, "Failed to send disconnect packet");
            }
        }

        self.transport.stop().await;
        self.state = ConnectionState::Disconnected;
        self.session = None;
        info!("Disconnected");
    }

    /// Current state machine position.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns `true` once the upgrade has completed.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Session id from the last successful handshake.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    /// Parsed handshake body from the last successful handshake.
    #[inline]
    #[must_use]
    pub fn handshake_info(&self) -> Option<&HandshakeInfo> {
        self.handshake.as_ref()
    }

    /// Endpoint of the current or last connection attempt.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// Event handler registry.
    #[inline]
    #[must_use]
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Active options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Underlying transport.
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

// ============================================================================
// Client - Internal
// ============================================================================

impl<T: Transport> Client<T> {
    /// Namespace as written in packet endpoints.
    pub(crate) fn packet_endpoint(&self) -> String {
        self.endpoint
            .as_ref()
            .map(|e| e.packet_endpoint().to_owned())
            .unwrap_or_default()
    }

    /// Frames and writes one packet.
    pub(crate) async fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        let text = packet.encode();
        let frame = encode_text_frame(text.as_bytes())?;
        self.transport.write_all(&frame).await?;
        trace!(packet = %text, "Packet sent");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::protocol::frame::MAX_PAYLOAD;
    use crate::transport::mock::MockTransport;

    fn connected_client(namespace: &str) -> Client<MockTransport> {
        let transport = MockTransport::attached(Vec::new());
        let mut client =
            Client::with_transport(transport, ClientOptions::new()).expect("valid options");
        client.endpoint = Some(Endpoint::new("localhost", 3000).with_namespace(namespace));
        client.state = ConnectionState::Connected;
        client
    }

    fn frame(text: &str) -> Vec<u8> {
        encode_text_frame(text.as_bytes()).expect("encode")
    }

    #[tokio::test]
    async fn test_emit_root_namespace() {
        let mut client = connected_client("/");
        client.emit("chat_message", "hello").await.expect("emit");

        assert_eq!(
            client.transport().last_written(),
            frame(r#"5:::{"name":"chat_message","args":["hello"]}"#)
        );
    }

    #[tokio::test]
    async fn test_emit_namespace() {
        let mut client = connected_client("/chat_room");
        client.emit("chat_message", "hello").await.expect("emit");

        assert_eq!(
            client.transport().last_written(),
            frame(r#"5::/chat_room:{"name":"chat_message","args":["hello"]}"#)
        );
    }

    #[tokio::test]
    async fn test_emit_escapes_and_extends_length() {
        let mut client = connected_client("/");
        let padding = "x".repeat(150);
        let data = format!("say \"{padding}\"");
        client.emit("quote", &data).await.expect("emit");

        let expected = format!(r#"5:::{{"name":"quote","args":["say \"{padding}\""]}}"#);
        let written = client.transport().last_written();
        assert_eq!(&written[..2], &[0x81, 126]);
        assert_eq!(written, frame(&expected));
    }

    #[tokio::test]
    async fn test_emit_escapes_event_name() {
        let mut client = connected_client("/");
        client.emit(r#"odd"name"#, "x").await.expect("emit");

        assert_eq!(
            client.transport().last_written(),
            frame(r#"5:::{"name":"odd\"name","args":["x"]}"#)
        );
    }

    #[tokio::test]
    async fn test_emit_json_args() {
        let mut client = connected_client("/");
        client
            .emit_json("stats", vec![json!({"rssi": -40}), json!(3)])
            .await
            .expect("emit");

        assert_eq!(
            client.transport().last_written(),
            frame(r#"5:::{"name":"stats","args":[{"rssi":-40},3]}"#)
        );
    }

    #[tokio::test]
    async fn test_emit_requires_connection() {
        let mut client =
            Client::with_transport(MockTransport::new(), ClientOptions::new()).expect("valid options");
        let err = client.emit("x", "y").await.expect_err("not connected");
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn test_emit_too_large() {
        let mut client = connected_client("/");
        let data = "x".repeat(MAX_PAYLOAD);
        let err = client.emit("big", &data).await.expect_err("too large");
        assert!(matches!(err, Error::FrameTooLarge { .. }));
        assert!(client.transport().last_written().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_sends_packet_and_stops() {
        let mut client = connected_client("/chat_room");
        client.disconnect().await;

        assert_eq!(client.transport().last_written(), frame("0::/chat_room"));
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(!client.transport().connected());
        assert!(client.session_id().is_none());
    }

    #[test]
    fn test_on_respects_capacity() {
        let options = ClientOptions::new().with_registry_capacity(1);
        let mut client =
            Client::with_transport(MockTransport::new(), options).expect("valid options");

        client.on("a", |_| None).expect("first");
        let err = client.on("b", |_| None).expect_err("full");
        assert!(err.is_capacity_error());
        assert_eq!(client.handlers().len(), 1);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = ClientOptions::new().with_registry_capacity(0);
        assert!(Client::with_transport(MockTransport::new(), options).is_err());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::WsUpgradeWait.to_string(), "ws-upgrade-wait");
    }
}
