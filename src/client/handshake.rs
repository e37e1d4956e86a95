//! Two-phase connection sequence.
//!
//! # Connection Flow
//!
//! 1. TCP connect, `GET /<resource>/1/` (HTTP handshake)
//! 2. `200 OK`, body `<sid>:<heartbeat>:<close>:<transports>`
//! 3. Close the socket, wait, reconnect
//! 4. `GET /<resource>/1/websocket/<sid>` with upgrade headers
//! 5. `101 Switching Protocols`, join the namespace if not `/`
//! 6. First polling pass
//!
//! The server does not keep the handshake socket alive, so the upgrade always
//! runs on a fresh connection.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::protocol::Packet;
use crate::transport::Transport;

use super::core::{Client, ConnectionState};
use super::endpoint::Endpoint;
use super::options::ClientOptions;

// ============================================================================
// Constants
// ============================================================================

/// Handshake success.
pub const HTTP_OK: u16 = 200;

/// Upgrade success.
pub const HTTP_SWITCHING_PROTOCOLS: u16 = 101;

/// Length of `HTTP/1.1 ` before the status code.
const STATUS_CODE_OFFSET: usize = 9;

/// Transport name the upgrade relies on.
const WEBSOCKET_TRANSPORT: &str = "websocket";

// ============================================================================
// HandshakeInfo
// ============================================================================

/// Parsed first line of the handshake body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeInfo {
    /// Session id, bounded to the configured capacity.
    pub session_id: SessionId,
    /// Heartbeat timeout announced by the server, `None` when disabled.
    pub heartbeat_timeout: Option<Duration>,
    /// Close timeout announced by the server, `None` when disabled.
    pub close_timeout: Option<Duration>,
    /// Transports the server offers.
    pub transports: Vec<String>,
}

impl HandshakeInfo {
    /// Parses `<sid>:<heartbeat>:<close>:<transports>`.
    ///
    /// Only the session id is required.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] if the session id is empty.
    pub fn parse(body: &str, max_sid_len: usize) -> Result<Self> {
        let mut fields = body.trim().split(':');

        let session_id = SessionId::bounded(fields.next().unwrap_or_default(), max_sid_len);
        if session_id.is_empty() {
            return Err(Error::protocol(format!(
                "handshake body without session id: {body:?}"
            )));
        }

        let heartbeat_timeout = fields.next().and_then(parse_seconds);
        let close_timeout = fields.next().and_then(parse_seconds);
        let transports = fields
            .next()
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            session_id,
            heartbeat_timeout,
            close_timeout,
            transports,
        })
    }

    /// Returns `true` if the server lists the websocket transport.
    #[must_use]
    pub fn supports_websocket(&self) -> bool {
        self.transports.iter().any(|t| t == WEBSOCKET_TRANSPORT)
    }
}

fn parse_seconds(field: &str) -> Option<Duration> {
    field
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

// ============================================================================
// Wire Helpers
// ============================================================================

/// Parses the status code of an HTTP status line.
///
/// The code is read after the fixed `HTTP/1.1 ` prefix; the reason phrase
/// is ignored.
#[must_use]
pub fn parse_status_code(line: &str) -> Option<u16> {
    let rest = line.get(STATUS_CODE_OFFSET..)?;
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// Builds the HTTP handshake request.
pub(crate) fn handshake_request(endpoint: &Endpoint, origin: &str) -> String {
    format!(
        "GET /{}/1/ HTTP/1.1\r\n\
         Host: {}\r\n\
         Origin: {}\r\n\
         \r\n",
        endpoint.resource(),
        endpoint.authority(),
        origin,
    )
}

/// Builds the WebSocket upgrade request.
pub(crate) fn upgrade_request(
    endpoint: &Endpoint,
    session_id: &SessionId,
    options: &ClientOptions,
) -> String {
    format!(
        "GET /{}/1/websocket/{} HTTP/1.1\r\n\
         Host: {}\r\n\
         Upgrade: WebSocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {}\r\n\
         Sec-WebSocket-Version: 13\r\n\
         Origin: {}\r\n\
         \r\n",
        endpoint.resource(),
        session_id,
        endpoint.authority(),
        options.websocket_key,
        options.upgrade_origin,
    )
}

fn is_chunk_size(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| c.is_ascii_hexdigit())
}

// ============================================================================
// Client - Connect
// ============================================================================

impl<T: Transport> Client<T> {
    /// Negotiates a session and upgrades to WebSocket.
    ///
    /// On success the client is [`ConnectionState::Connected`] and one
    /// polling pass has already run. On failure the transport is closed and
    /// the state is [`ConnectionState::Failed`]. There is no retry.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if either TCP connection fails
    /// - [`Error::ConnectionTimeout`] if a response does not start in time
    /// - [`Error::UnexpectedStatus`] for anything but `200` / `101`
    /// - [`Error::Protocol`] for an unparsable status line or body
    pub async fn connect(&mut self, endpoint: Endpoint) -> Result<()> {
        info!(%endpoint, "Connecting");

        self.session = None;
        self.handshake = None;
        self.endpoint = Some(endpoint.clone());

        if let Err(e) = self.run_handshake(&endpoint).await {
            warn!(error = %e, state = %self.state, "Connection attempt failed");
            self.transport.stop().await;
            self.state = ConnectionState::Failed;
            return Err(e);
        }

        if let Err(e) = self.poll().await {
            warn!(error = %e, "Initial poll failed");
        }
        Ok(())
    }

    async fn run_handshake(&mut self, endpoint: &Endpoint) -> Result<()> {
        // Phase 1: HTTP handshake
        self.state = ConnectionState::HttpHandshake;
        self.transport
            .connect(endpoint.host(), endpoint.port())
            .await?;

        let request = handshake_request(endpoint, &self.options.origin);
        self.transport.write_all(request.as_bytes()).await?;

        self.state = ConnectionState::HttpResponseWait;
        self.wait_for_response().await?;
        self.expect_status(HTTP_OK).await?;

        let chunked = self.skip_header().await?;
        let body = self.read_handshake_body(chunked).await?;
        let info = HandshakeInfo::parse(&body, self.options.max_sid_len)?;

        if !info.supports_websocket() {
            warn!(transports = ?info.transports, "Server does not list the websocket transport");
        }
        info!(
            sid = %info.session_id,
            heartbeat = ?info.heartbeat_timeout,
            "Handshake complete"
        );

        self.drain().await;
        self.transport.stop().await;
        let session_id = info.session_id.clone();
        self.session = Some(info.session_id.clone());
        self.handshake = Some(info);
        self.state = ConnectionState::SidExtracted;

        sleep(self.options.reconnect_delay).await;

        // Phase 2: WebSocket upgrade on a fresh connection
        if let Err(e) = self
            .transport
            .connect(endpoint.host(), endpoint.port())
            .await
        {
            warn!(error = %e, "Reconnect for upgrade failed");
            return Err(e);
        }
        debug!("Reconnected for WebSocket upgrade");

        let request = upgrade_request(endpoint, &session_id, &self.options);
        self.transport.write_all(request.as_bytes()).await?;

        self.state = ConnectionState::WsUpgradeWait;
        self.wait_for_response().await?;
        self.expect_status(HTTP_SWITCHING_PROTOCOLS).await?;

        if !endpoint.is_root_namespace() {
            debug!(namespace = endpoint.namespace(), "Joining namespace");
            self.send_packet(&Packet::connect(endpoint.namespace()))
                .await?;
        }

        self.skip_header().await?;
        self.state = ConnectionState::Connected;
        info!(sid = %session_id, namespace = endpoint.namespace(), "WebSocket connected");
        Ok(())
    }

    /// Waits for the first byte of a response.
    async fn wait_for_response(&mut self) -> Result<()> {
        let timeout = self.options.handshake_timeout;
        if self.transport.wait_for_data(timeout).await? {
            Ok(())
        } else {
            Err(Error::connection_timeout(timeout.as_millis() as u64))
        }
    }

    /// Reads the status line and checks its code.
    async fn expect_status(&mut self, expected: u16) -> Result<()> {
        self.reader.read_unit(&mut self.transport).await?;
        let line = self.reader.text().into_owned();

        match parse_status_code(&line) {
            Some(code) if code == expected => {
                debug!(code, "Status line accepted");
                Ok(())
            }
            Some(code) => {
                self.drain().await;
                Err(Error::unexpected_status(expected, code))
            }
            None => {
                self.drain().await;
                Err(Error::protocol(format!("malformed status line: {line:?}")))
            }
        }
    }

    /// Consumes header lines up to the blank separator.
    ///
    /// Returns `true` if the header announced chunked transfer encoding.
    async fn skip_header(&mut self) -> Result<bool> {
        let mut chunked = false;
        while self.reader.has_more(&mut self.transport).await? {
            self.reader.read_unit(&mut self.transport).await?;
            if self.reader.is_empty() {
                break;
            }

            let line = self.reader.text().to_ascii_lowercase();
            if line.starts_with("transfer-encoding:") && line.contains("chunked") {
                chunked = true;
            }
        }
        Ok(chunked)
    }

    /// Returns the first non-blank body line, skipping a chunk size line.
    async fn read_handshake_body(&mut self, chunked: bool) -> Result<String> {
        let mut expect_chunk_size = chunked;
        while self.reader.has_more(&mut self.transport).await? {
            self.reader.read_unit(&mut self.transport).await?;
            if self.reader.is_empty() {
                continue;
            }

            let line = self.reader.text().into_owned();
            if expect_chunk_size && is_chunk_size(&line) {
                expect_chunk_size = false;
                continue;
            }
            return Ok(line);
        }
        Err(Error::protocol("handshake response has no body"))
    }

    /// Discards everything currently readable.
    async fn drain(&mut self) {
        while let Ok(n) = self.transport.available() {
            if n == 0 || self.transport.read_byte().await.is_err() {
                break;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::protocol::encode_text_frame;
    use crate::transport::mock::MockTransport;

    const HANDSHAKE_OK: &[u8] = b"HTTP/1.1 200 OK\r\n\
        Content-Type: text/plain\r\n\
        Connection: close\r\n\
        \r\n\
        abc123:60:25:websocket,xhr-polling";

    const UPGRADE_OK: &[u8] = b"HTTP/1.1 101 Switching Protocols\r\n\
        Upgrade: websocket\r\n\
        Connection: Upgrade\r\n\
        \r\n";

    fn frame(text: &str) -> Vec<u8> {
        encode_text_frame(text.as_bytes()).expect("encode")
    }

    fn upgrade_then(frames: &[&str]) -> Vec<u8> {
        let mut bytes = UPGRADE_OK.to_vec();
        for text in frames {
            bytes.extend(frame(text));
        }
        bytes
    }

    fn client(transport: MockTransport) -> Client<MockTransport> {
        let options = ClientOptions::new()
            .with_reconnect_delay(Duration::ZERO)
            .with_line_grace(Duration::ZERO);
        Client::with_transport(transport, options).expect("valid options")
    }

    fn endpoint() -> Endpoint {
        Endpoint::new("localhost", 3000)
    }

    #[tokio::test]
    async fn test_connect_root_namespace() {
        let transport = MockTransport::new()
            .accept(HANDSHAKE_OK)
            .accept(upgrade_then(&["1::"]));
        let mut client = client(transport);

        client.connect(endpoint()).await.expect("connect");

        assert_eq!(client.state(), ConnectionState::Connected);
        assert_eq!(client.session_id().map(SessionId::as_str), Some("abc123"));

        let transport = client.transport();
        assert_eq!(transport.attempts.len(), 2);
        assert!(transport.attempts.iter().all(|(h, p)| h == "localhost" && *p == 3000));
        assert_eq!(
            transport.written(0),
            b"GET /socket.io/1/ HTTP/1.1\r\nHost: localhost:3000\r\nOrigin: Arduino\r\n\r\n"
        );
        assert_eq!(
            transport.written(1),
            "GET /socket.io/1/websocket/abc123 HTTP/1.1\r\n\
             Host: localhost:3000\r\n\
             Upgrade: WebSocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Key: x3JJHMbDL1EzLkh9GBhXDw==\r\n\
             Sec-WebSocket-Version: 13\r\n\
             Origin: ArduinoSocketIOClient\r\n\
             \r\n"
                .as_bytes()
        );
        assert_eq!(transport.stops, 1);
    }

    #[tokio::test]
    async fn test_handshake_info_recorded() {
        let transport = MockTransport::new()
            .accept(HANDSHAKE_OK)
            .accept(upgrade_then(&[]));
        let mut client = client(transport);
        client.connect(endpoint()).await.expect("connect");

        let info = client.handshake_info().expect("info");
        assert_eq!(info.heartbeat_timeout, Some(Duration::from_secs(60)));
        assert_eq!(info.close_timeout, Some(Duration::from_secs(25)));
        assert_eq!(info.transports, vec!["websocket", "xhr-polling"]);
        assert!(info.supports_websocket());
    }

    #[tokio::test]
    async fn test_connect_joins_namespace() {
        let transport = MockTransport::new()
            .accept(HANDSHAKE_OK)
            .accept(upgrade_then(&["1::/chat_room"]));
        let mut client = client(transport);

        client
            .connect(endpoint().with_namespace("/chat_room"))
            .await
            .expect("connect");

        let written = client.transport().written(1);
        assert!(written.ends_with(&frame("1::/chat_room")));
    }

    #[tokio::test]
    async fn test_handshake_status_not_ok() {
        let transport = MockTransport::new()
            .accept(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\n\r\n".to_vec());
        let mut client = client(transport);

        let err = client.connect(endpoint()).await.expect_err("503");
        assert!(matches!(
            err,
            Error::UnexpectedStatus {
                expected: 200,
                actual: 503
            }
        ));
        assert_eq!(client.state(), ConnectionState::Failed);
        assert!(!client.transport().connected());
        assert_eq!(client.transport().attempts.len(), 1);
    }

    #[tokio::test]
    async fn test_upgrade_status_not_switching() {
        let transport = MockTransport::new()
            .accept(HANDSHAKE_OK)
            .accept(b"HTTP/1.1 400 Bad Request\r\n\r\n".to_vec());
        let mut client = client(transport);

        let err = client.connect(endpoint()).await.expect_err("400");
        assert!(matches!(
            err,
            Error::UnexpectedStatus {
                expected: 101,
                actual: 400
            }
        ));
        assert_eq!(client.state(), ConnectionState::Failed);
        assert!(!client.transport().connected());
        assert_eq!(client.transport().attempts.len(), 2);
    }

    #[tokio::test]
    async fn test_no_response_times_out() {
        let transport = MockTransport::new().accept(Vec::new());
        let mut client = client(transport);

        let err = client.connect(endpoint()).await.expect_err("timeout");
        assert!(matches!(err, Error::ConnectionTimeout { timeout_ms: 30_000 }));
        assert!(err.is_timeout());
        assert!(!client.transport().connected());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let mut client = client(MockTransport::new().refuse());

        let err = client.connect(endpoint()).await.expect_err("refused");
        assert!(err.is_transport_error());
        assert_eq!(client.state(), ConnectionState::Failed);
    }

    #[tokio::test]
    async fn test_reconnect_for_upgrade_refused() {
        let transport = MockTransport::new().accept(HANDSHAKE_OK).refuse();
        let mut client = client(transport);

        let err = client.connect(endpoint()).await.expect_err("refused");
        assert!(matches!(err, Error::Connection { .. }));
        assert_eq!(client.transport().attempts.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_status_line() {
        let transport = MockTransport::new().accept(b"garbage\r\n\r\n".to_vec());
        let mut client = client(transport);

        let err = client.connect(endpoint()).await.expect_err("garbage");
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[tokio::test]
    async fn test_chunked_handshake_body() {
        let response = b"HTTP/1.1 200 OK\r\n\
            Transfer-Encoding: chunked\r\n\
            \r\n\
            16\r\n\
            abc123:60:25:websocket\r\n\
            0\r\n\
            \r\n";
        let transport = MockTransport::new()
            .accept(response.to_vec())
            .accept(upgrade_then(&[]));
        let mut client = client(transport);

        client.connect(endpoint()).await.expect("connect");
        assert_eq!(client.session_id().map(SessionId::as_str), Some("abc123"));
    }

    #[tokio::test]
    async fn test_long_session_id_truncated() {
        let sid = "s".repeat(40);
        let mut response = b"HTTP/1.1 200 OK\r\n\r\n".to_vec();
        response.extend_from_slice(format!("{sid}:60:25:websocket").as_bytes());
        let transport = MockTransport::new()
            .accept(response)
            .accept(upgrade_then(&[]));
        let mut client = client(transport);

        client.connect(endpoint()).await.expect("connect");
        let stored = client.session_id().expect("sid");
        assert_eq!(stored.as_str(), &sid[..23]);

        let upgrade = String::from_utf8_lossy(client.transport().written(1)).into_owned();
        assert!(upgrade.starts_with(&format!("GET /socket.io/1/websocket/{} ", &sid[..23])));
    }

    #[tokio::test]
    async fn test_first_poll_dispatches_pending_event() {
        let transport = MockTransport::new().accept(HANDSHAKE_OK).accept(upgrade_then(&[
            "1::",
            r#"5:::{"name":"welcome","args":["hi"]}"#,
        ]));
        let mut client = client(transport);

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        client
            .on("welcome", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                None
            })
            .expect("register");

        client.connect(endpoint()).await.expect("connect");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_session_id_rejected() {
        let transport =
            MockTransport::new().accept(b"HTTP/1.1 200 OK\r\n\r\n:60:25:websocket".to_vec());
        let mut client = client(transport);

        let err = client.connect(endpoint()).await.expect_err("empty sid");
        assert!(matches!(err, Error::Protocol { .. }));
        assert!(!client.transport().connected());
    }

    #[test]
    fn test_parse_status_code() {
        assert_eq!(parse_status_code("HTTP/1.1 200 OK"), Some(200));
        assert_eq!(parse_status_code("HTTP/1.1 101 Switching Protocols"), Some(101));
        assert_eq!(parse_status_code("HTTP/1.1 503"), Some(503));
        assert_eq!(parse_status_code("HTTP/1.1"), None);
        assert_eq!(parse_status_code("garbage"), None);
    }

    #[test]
    fn test_handshake_info_sid() {
        let info = HandshakeInfo::parse("abc123:60:25:websocket", 24).expect("parse");
        assert_eq!(info.session_id.as_str(), "abc123");

        let info = HandshakeInfo::parse("abc123::", 24).expect("parse");
        assert!(info.heartbeat_timeout.is_none());
        assert!(info.transports.is_empty());
        assert!(!info.supports_websocket());
    }
}
