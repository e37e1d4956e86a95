//! Event message types.
//!
//! Events are type-5 packets carrying a JSON object with the event name and
//! its arguments.
//!
//! # Format
//!
//! ```text
//! 5::<endpoint>:{"name":"chat message","args":["hello"]}
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

use super::packet::{Packet, PacketKind};

// ============================================================================
// EventPayload
// ============================================================================

/// JSON body of an event packet. Field order is `name`, then `args`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct EventPayload {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl EventPayload {
    /// Serializes to compact JSON.
    pub(crate) fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Event
// ============================================================================

/// An inbound event, as handed to a registered handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event name, the registry key.
    pub name: String,

    /// Decoded `args` array.
    pub args: Vec<Value>,

    /// Namespace endpoint, empty for the root namespace.
    pub namespace: String,

    /// Raw JSON object the event was decoded from.
    pub raw: String,
}

impl Event {
    /// Decodes an event from one inbound unit.
    ///
    /// The JSON region starts at the first `{` after the packet header.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] if the unit is not an event or carries no object
    /// - [`Error::Json`] if the object is malformed or has no `name`
    pub fn decode(text: &str) -> Result<Self> {
        let packet = Packet::parse(text)?;
        if packet.kind != PacketKind::Event {
            return Err(Error::protocol(format!(
                "expected event packet, got {}",
                packet.kind
            )));
        }

        let data = packet.data.unwrap_or_default();
        let start = data
            .find('{')
            .ok_or_else(|| Error::protocol("event packet without JSON object"))?;
        let raw = &data[start..];
        let payload: EventPayload = serde_json::from_str(raw)?;

        Ok(Self {
            name: payload.name,
            args: payload.args,
            namespace: packet.endpoint,
            raw: raw.to_owned(),
        })
    }

    /// Returns the first argument as a string, if it is one.
    #[inline]
    #[must_use]
    pub fn first_str(&self) -> Option<&str> {
        self.args.first().and_then(Value::as_str)
    }
}

// ============================================================================
// EventReply
// ============================================================================

/// An event a handler asks the client to emit in response.
#[derive(Debug, Clone, PartialEq)]
pub struct EventReply {
    /// Event name to emit.
    pub event: String,

    /// Arguments to emit.
    pub args: Vec<Value>,
}

impl EventReply {
    /// Creates a reply with a single string argument.
    #[inline]
    #[must_use]
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            args: vec![Value::String(data.into())],
        }
    }

    /// Creates a reply with arbitrary JSON arguments.
    #[inline]
    #[must_use]
    pub fn json(event: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            event: event.into(),
            args,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
