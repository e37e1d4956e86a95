//! Capacity-bounded event handler registry.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::{Event, EventReply};

// ============================================================================
// Types
// ============================================================================

/// Event handler callback type.
///
/// Called once per matching inbound event.
/// Return `Some(EventReply)` to emit an event back to the server.
pub type EventHandler = Box<dyn Fn(&Event) -> Option<EventReply> + Send + Sync>;

// ============================================================================
// HandlerRegistry
// ============================================================================

/// Maps event names to handlers, up to a fixed number of bindings.
///
/// Bindings are never removed. Registering an existing name replaces its
/// handler without using another slot.
pub struct HandlerRegistry {
    handlers: FxHashMap<String, EventHandler>,
    capacity: usize,
}

impl HandlerRegistry {
    /// Creates an empty registry with room for `capacity` handlers.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            handlers: FxHashMap::default(),
            capacity,
        }
    }

    /// Binds `handler` to `name`.
    ///
    /// # Errors
    ///
    /// [`Error::RegistryFull`] if `name` is new and every slot is taken.
    /// The registry is left unchanged.
    pub fn register(&mut self, name: impl Into<String>, handler: EventHandler) -> Result<()> {
        let name = name.into();

        if let Some(slot) = self.handlers.get_mut(&name) {
            debug!(event = %name, "Replacing event handler");
            *slot = handler;
            return Ok(());
        }

        if self.handlers.len() >= self.capacity {
            warn!(
                event = %name,
                capacity = self.capacity,
                "Max number of event handlers reached"
            );
            return Err(Error::registry_full(self.capacity));
        }

        debug!(event = %name, "Registered event handler");
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Returns the handler bound to `name`.
    #[inline]
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&EventHandler> {
        self.handlers.get(name)
    }

    /// Returns `true` if `name` has a handler.
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of bound handlers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handler is bound.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Maximum number of handlers.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("events", &self.handlers.keys().collect::<Vec<_>>())
            .field("capacity", &self.capacity)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
