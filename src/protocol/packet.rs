//! Socket.IO v0.9 packet model.
//!
//! Every message on the wire is `type:id:endpoint[:data]`:
//!
//! | Type | Name | Example |
//! |------|------|---------|
//! | 0 | disconnect | `0::/chat` |
//! | 1 | connect | `1::/chat` |
//! | 2 | heartbeat | `2::` |
//! | 3 | message | `3:::hello` |
//! | 4 | json | `4:::{"a":1}` |
//! | 5 | event | `5:::{"name":"foo","args":[]}` |
//! | 6 | ack | `6:::4+["A"]` |
//! | 7 | error | `7::/chat:2+0` |
//! | 8 | noop | `8::` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::error::{Error, Result};

// ============================================================================
// PacketKind
// ============================================================================

/// Packet type, the leading digit of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// Close the endpoint (or the whole socket when empty).
    Disconnect,
    /// Endpoint connect request / acknowledgment.
    Connect,
    /// Keep-alive.
    Heartbeat,
    /// Plain text message.
    Message,
    /// JSON message.
    Json,
    /// Named event with arguments.
    Event,
    /// Acknowledgment of a message id.
    Ack,
    /// Server-side error report.
    Error,
    /// No operation.
    Noop,
}

impl PacketKind {
    /// Parses the leading type digit.
    #[must_use]
    pub fn from_digit(digit: u8) -> Option<Self> {
        Some(match digit {
            b'0' => Self::Disconnect,
            b'1' => Self::Connect,
            b'2' => Self::Heartbeat,
            b'3' => Self::Message,
            b'4' => Self::Json,
            b'5' => Self::Event,
            b'6' => Self::Ack,
            b'7' => Self::Error,
            b'8' => Self::Noop,
            _ => return None,
        })
    }

    /// Returns the wire digit.
    #[must_use]
    pub const fn digit(self) -> char {
        match self {
            Self::Disconnect => '0',
            Self::Connect => '1',
            Self::Heartbeat => '2',
            Self::Message => '3',
            Self::Json => '4',
            Self::Event => '5',
            Self::Ack => '6',
            Self::Error => '7',
            Self::Noop => '8',
        }
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnect => "disconnect",
            Self::Connect => "connect",
            Self::Heartbeat => "heartbeat",
            Self::Message => "message",
            Self::Json => "json",
            Self::Event => "event",
            Self::Ack => "ack",
            Self::Error => "error",
            Self::Noop => "noop",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Packet
// ============================================================================

/// One protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet type.
    pub kind: PacketKind,
    /// Message id, empty when absent.
    pub id: String,
    /// Namespace endpoint, empty for the root namespace.
    pub endpoint: String,
    /// Payload after the third colon, if any.
    pub data: Option<String>,
}

impl Packet {
    /// Creates a packet with no id.
    #[must_use]
    pub fn new(kind: PacketKind, endpoint: impl Into<String>, data: Option<String>) -> Self {
        Self {
            kind,
            id: String::new(),
            endpoint: endpoint.into(),
            data,
        }
    }

    /// `2::`
    #[must_use]
    pub fn heartbeat() -> Self {
        Self::new(PacketKind::Heartbeat, "", None)
    }

    /// `1::<endpoint>`
    #[must_use]
    pub fn connect(endpoint: impl Into<String>) -> Self {
        Self::new(PacketKind::Connect, endpoint, None)
    }

    /// `0::<endpoint>`
    #[must_use]
    pub fn disconnect(endpoint: impl Into<String>) -> Self {
        Self::new(PacketKind::Disconnect, endpoint, None)
    }

    /// `5::<endpoint>:<json>`
    #[must_use]
    pub fn event(endpoint: impl Into<String>, json: impl Into<String>) -> Self {
        Self::new(PacketKind::Event, endpoint, Some(json.into()))
    }

    /// Parses `type:id:endpoint[:data]`.
    ///
    /// Missing trailing fields are treated as empty, so `2` and `2::` are
    /// the same heartbeat.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] if the type digit is missing or unknown.
    pub fn parse(text: &str) -> Result<Self> {
        let mut fields = text.splitn(4, ':');

        let kind = fields
            .next()
            .and_then(|digit| match digit.as_bytes() {
                [d] => PacketKind::from_digit(*d),
                _ => None,
            })
            .ok_or_else(|| Error::protocol(format!("invalid packet type in {text:?}")))?;

        Ok(Self {
            kind,
            id: fields.next().unwrap_or_default().to_owned(),
            endpoint: fields.next().unwrap_or_default().to_owned(),
            data: fields.next().map(str::to_owned),
        })
    }

    /// Encodes to the wire form.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = format!("{}:{}:{}", self.kind.digit(), self.id, self.endpoint);
        if let Some(data) = &self.data {
            out.push(':');
            out.push_str(data);
        }
        out
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

// ============================================================================
// Tests
// ============================================================================
