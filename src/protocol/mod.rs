//! Socket.IO v0.9 wire protocol.
//!
//! # Protocol Overview
//!
//! | Layer | Unit | Module |
//! |-------|------|--------|
//! | HTTP | CRLF line | `frame` |
//! | WebSocket | single text frame | `frame` |
//! | Socket.IO | `type:id:endpoint:data` packet | `packet` |
//! | Application | `{"name":..,"args":[..]}` event | `event` |
//!
//! Only connect (1), heartbeat (2) and event (5) packets are acted on by the
//! client; the others parse but are dropped.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `frame` | WebSocket framing and line reading |
//! | `packet` | Packet types and encoding |
//! | `event` | Event and EventReply types |

// ============================================================================
// Submodules
// ============================================================================

/// Event message types.
pub mod event;

/// WebSocket framing and HTTP line reading.
pub mod frame;

/// Packet model.
pub mod packet;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{Event, EventReply};
pub(crate) use event::EventPayload;
pub use frame::{FrameReader, Unit, encode_text_frame};
pub use packet::{Packet, PacketKind};
