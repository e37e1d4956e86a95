//! Socket.IO v0.9 client over a minimal WebSocket framing layer.
//!
//! This library connects to a legacy Socket.IO server, keeps the session
//! alive by answering heartbeats, emits named events and routes inbound
//! events to registered handlers.
//!
//! # Architecture
//!
//! The client is a single cooperative task:
//!
//! - **Handshake**: HTTP `GET` yields a session id, then a second TCP
//!   connection is upgraded to WebSocket
//! - **Polling**: [`Client::poll`] drains whatever frames have arrived and
//!   returns without waiting for more
//! - **Framing**: single unfragmented text frames, 7-bit or 16-bit lengths
//!
//! Key design principles:
//!
//! - The client owns its [`Transport`] exclusively (`&mut self` everywhere)
//! - One reusable inbound buffer, bounded in size
//! - Malformed frames are dropped, never fatal
//!
//! # Quick Start
//!
//! ```no_run
//! use socketio_legacy::{Client, Endpoint, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut client = Client::builder().build()?;
//!
//!     client.on("chat message", |event| {
//!         println!("received: {:?}", event.first_str());
//!         None
//!     })?;
//!
//!     client
//!         .connect(Endpoint::new("192.168.0.10", 3000).with_namespace("/chat_room"))
//!         .await?;
//!     client.emit("chat_message", "hello").await?;
//!
//!     loop {
//!         client.poll().await?;
//!         tokio::time::sleep(std::time::Duration::from_millis(50)).await;
//!     }
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Client`], configuration, handshake and dispatch |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Framing, packets and events |
//! | [`transport`] | Byte-stream transport trait and TCP implementation |
//!
//! # Limitations
//!
//! - No TLS, no binary or fragmented frames, no client-side masking
//! - No acknowledgment callbacks or message ids
//! - No automatic session renegotiation after a drop

// ============================================================================
// Modules
// ============================================================================

/// Socket.IO client.
///
/// Use [`Client::builder()`] to create a configured client.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Socket.IO v0.9 wire protocol.
///
/// WebSocket framing, packet model and event payloads.
pub mod protocol;

/// Byte-stream transport layer.
///
/// The [`Transport`] trait and its tokio TCP implementation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{
    Client, ClientBuilder, ClientOptions, ConnectionState, Endpoint, EventHandler,
    HandlerRegistry, HandshakeInfo, PollReport,
};

// Error types
pub use error::{Error, ErrorKind, Result};

// Identifier types
pub use identifiers::SessionId;

// Protocol types
pub use protocol::{Event, EventReply, Packet, PacketKind};

// Transport types
pub use transport::{TcpTransport, Transport};
