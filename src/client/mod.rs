//! Socket.IO client.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Connection, emit and polling API |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ClientOptions`] | Timeouts, header values and bounds |
//! | [`Endpoint`] | Host, port, resource and namespace |
//! | [`HandlerRegistry`] | Capacity-bounded event handler map |
//! | [`HandshakeInfo`] | Parsed handshake body |
//! | [`PollReport`] | Outcome of one polling pass |
//!
//! # Example
//!
//! ```no_run
//! use socketio_legacy::{Client, Endpoint, EventReply};
//!
//! # async fn example() -> socketio_legacy::Result<()> {
//! let mut client = Client::builder().build()?;
//!
//! client.on("ping", |event| {
//!     Some(EventReply::new("pong", event.first_str().unwrap_or_default()))
//! })?;
//!
//! client.connect(Endpoint::parse("http://localhost:3000")?).await?;
//! client.emit("hello", "world").await?;
//!
//! let report = client.poll().await?;
//! println!("{} events handled", report.events);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Client type and connection state.
pub mod core;

/// Inbound frame dispatch.
pub mod dispatcher;

/// Connection endpoint.
pub mod endpoint;

/// HTTP handshake and WebSocket upgrade.
pub mod handshake;

/// Client options.
pub mod options;

/// Event handler registry.
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use core::{Client, ConnectionState};
pub use dispatcher::PollReport;
pub use endpoint::Endpoint;
pub use handshake::HandshakeInfo;
pub use options::ClientOptions;
pub use registry::{EventHandler, HandlerRegistry};
