//! Inbound frame dispatch.
//!
//! One [`Client::poll`] call drains every unit that is readable right now,
//! in arrival order. Heartbeats are answered before the next unit is read;
//! events go to their registered handler.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{Event, Packet, PacketKind};
use crate::transport::Transport;

use super::core::{Client, ConnectionState};

// ============================================================================
// PollReport
// ============================================================================

/// What one polling pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Units read, dropped ones included.
    pub frames: usize,
    /// Connect acknowledgments.
    pub acks: usize,
    /// Heartbeats answered.
    pub heartbeats: usize,
    /// Events delivered to a handler.
    pub events: usize,
    /// Events with no handler bound.
    pub unhandled: usize,
    /// Units discarded as malformed or unsupported.
    pub dropped: usize,
    /// `true` if the pass started with a reconnect.
    pub reconnected: bool,
}

impl PollReport {
    /// Returns `true` if nothing was read.
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.frames == 0
    }
}

// ============================================================================
// Client - Polling
// ============================================================================

impl<T: Transport> Client<T> {
    /// Processes all currently readable frames.
    ///
    /// If the transport of an established session has dropped, one reconnect
    /// to the last endpoint is attempted first. A successful reconnect puts
    /// the client back in [`ConnectionState::Connected`]. Never waits for data
    /// that has not arrived.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] without an established session, including
    ///   after [`Client::disconnect`] or a failed [`Client::connect`]
    /// - [`Error::Connection`] if the reconnect fails
    /// - transport errors while reading or answering
    ///
    /// Malformed frames are dropped and counted, never returned.
    pub async fn poll(&mut self) -> Result<PollReport> {
        let mut report = PollReport::default();

        if !self.transport.connected() {
            self.reconnect().await?;
            report.reconnected = true;
        }

        while self.transport.available()? > 0 {
            report.frames += 1;

            match self.reader.read_unit(&mut self.transport).await {
                Ok(_) => {}
                Err(e) if e.is_protocol_error() => {
                    warn!(error = %e, "Dropping unreadable frame");
                    report.dropped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            }

            let text = self.reader.text().into_owned();
            self.dispatch(&text, &mut report).await?;
        }

        if !report.is_idle() {
            trace!(?report, "Poll pass complete");
        }
        Ok(report)
    }

    /// Reopens the TCP connection to the last endpoint.
    ///
    /// Only the socket is restored; the session is not renegotiated.
    /// Requires a session that was established and not explicitly closed.
    async fn reconnect(&mut self) -> Result<()> {
        let resumable = matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::Disconnected
        ) && self.session.is_some();

        let Some(endpoint) = self.endpoint.clone().filter(|_| resumable) else {
            return Err(Error::NotConnected);
        };

        info!(%endpoint, "Transport dropped, reconnecting");
        if let Err(e) = self
            .transport
            .connect(endpoint.host(), endpoint.port())
            .await
        {
            warn!(error = %e, "Reconnect failed");
            self.state = ConnectionState::Disconnected;
            return Err(e);
        }

        self.state = ConnectionState::Connected;
        Ok(())
    }

    /// Acts on one unit according to its leading type digit.
    async fn dispatch(&mut self, text: &str, report: &mut PollReport) -> Result<()> {
        let kind = text.bytes().next().and_then(PacketKind::from_digit);

        match kind {
            Some(PacketKind::Connect) => {
                debug!(unit = text, "Connect acknowledged");
                report.acks += 1;
            }
            Some(PacketKind::Heartbeat) => {
                self.send_packet(&Packet::heartbeat()).await?;
                trace!("Heartbeat answered");
                report.heartbeats += 1;
            }
            Some(PacketKind::Event) => self.dispatch_event(text, report).await?,
            _ => {
                warn!(unit = text, "Dropping unsupported unit");
                report.dropped += 1;
            }
        }
        Ok(())
    }

    async fn dispatch_event(&mut self, text: &str, report: &mut PollReport) -> Result<()> {
        let event = match Event::decode(text) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, unit = text, "Dropping malformed event");
                report.dropped += 1;
                return Ok(());
            }
        };

        let Some(handler) = self.registry.lookup(&event.name) else {
            debug!(event = %event.name, "No handler bound");
            report.unhandled += 1;
            return Ok(());
        };

        debug!(event = %event.name, "Dispatching event");
        let reply = handler(&event);
        report.events += 1;

        if let Some(reply) = reply {
            match self.emit_json(&reply.event, reply.args).await {
                Ok(()) => {}
                Err(e) if e.is_protocol_error() => {
                    warn!(error = %e, event = %reply.event, "Handler reply not sent");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
