//! Type-safe identifier wrappers.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// SessionId
// ============================================================================

/// Session identifier issued by the server during the HTTP handshake.
///
/// Opaque to the client. Only used to build the WebSocket upgrade path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a session id, truncated to `capacity - 1` bytes.
    ///
    /// The capacity counts a terminator slot, so a capacity of 24 keeps at
    /// most 23 bytes. Truncation never splits a UTF-8 character.
    #[must_use]
    pub fn bounded(raw: &str, capacity: usize) -> Self {
        let limit = capacity.saturating_sub(1);
        if raw.len() <= limit {
            return Self(raw.to_owned());
        }

        let mut end = limit;
        while !raw.is_char_boundary(end) {
            end -= 1;
        }
        Self(raw[..end].to_owned())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the server sent an empty id.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Tests
// ============================================================================
