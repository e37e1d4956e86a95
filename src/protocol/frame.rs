//! Minimal WebSocket framing and HTTP line reading.
//!
//! Before the upgrade the server speaks HTTP, afterwards it speaks WebSocket.
//! [`FrameReader::read_unit`] tells the two apart from the first byte:
//!
//! | First byte | Unit |
//! |------------|------|
//! | `0x81` | single final text frame |
//! | other high-bit byte, `0x00..=0x02` | unsupported frame (error) |
//! | anything else | CRLF-terminated line |
//!
//! Frames from the server are expected unmasked. Only 7-bit and 16-bit
//! lengths are accepted.

// ============================================================================
// Imports
// ============================================================================

use std::borrow::Cow;
use std::time::Duration;

use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::transport::Transport;

// ============================================================================
// Constants
// ============================================================================

/// First byte of a final text frame.
pub const FIN_TEXT: u8 = 0x81;

/// Length byte announcing a 16-bit extended length.
pub const EXTENDED_LENGTH: u8 = 126;

/// Length byte announcing a 64-bit extended length.
const EXTENDED_LENGTH_64: u8 = 127;

/// Largest payload that fits the 7-bit length field.
pub const MAX_SHORT_PAYLOAD: usize = 125;

/// Largest payload that fits the 16-bit length field.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

const FIN_BIT: u8 = 0x80;
const MASK_BIT: u8 = 0x80;
const OPCODE_MASK: u8 = 0x0F;
const OPCODE_TEXT: u8 = 0x1;

/// First bytes up to this are fragment headers, not line starts.
const FRAGMENT_CEILING: u8 = 0x02;

// ============================================================================
// Encoding
// ============================================================================

/// Wraps `payload` in a single final text frame.
///
/// Uses the 16-bit extended length for payloads of 126 bytes or more.
///
/// # Errors
///
/// [`Error::FrameTooLarge`] above [`MAX_PAYLOAD`] bytes.
pub fn encode_text_frame(payload: &[u8]) -> Result<Vec<u8>> {
    let len = payload.len();
    let mut frame = Vec::with_capacity(len + 4);
    frame.push(FIN_TEXT);

    match u16::try_from(len) {
        Ok(short) if len <= MAX_SHORT_PAYLOAD => frame.push(short as u8),
        Ok(extended) => {
            frame.push(EXTENDED_LENGTH);
            frame.extend_from_slice(&extended.to_be_bytes());
        }
        Err(_) => return Err(Error::frame_too_large(len, MAX_PAYLOAD)),
    }

    frame.extend_from_slice(payload);
    Ok(frame)
}

// ============================================================================
// FrameHeader
// ============================================================================

/// Decoded fixed part of an inbound frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameHeader {
    fin: bool,
    opcode: u8,
    masked: bool,
    len: u64,
}

impl FrameHeader {
    /// Reads the length and optional masking key following `first`.
    async fn read<T: Transport + ?Sized>(first: u8, transport: &mut T) -> Result<Self> {
        let second = transport.read_byte().await?;
        let masked = second & MASK_BIT != 0;

        let len = match second & !MASK_BIT {
            EXTENDED_LENGTH => {
                let hi = transport.read_byte().await?;
                let lo = transport.read_byte().await?;
                u64::from(u16::from_be_bytes([hi, lo]))
            }
            EXTENDED_LENGTH_64 => {
                let mut bytes = [0u8; 8];
                for byte in &mut bytes {
                    *byte = transport.read_byte().await?;
                }
                u64::from_be_bytes(bytes)
            }
            short => u64::from(short),
        };

        if masked {
            for _ in 0..4 {
                transport.read_byte().await?;
            }
        }

        Ok(Self {
            fin: first & FIN_BIT != 0,
            opcode: first & OPCODE_MASK,
            masked,
            len,
        })
    }

    /// Returns why the codec cannot accept this frame, if it cannot.
    fn rejection(&self, max_len: usize) -> Option<String> {
        if !self.fin {
            return Some("fragmented frames are not supported".to_owned());
        }
        if self.opcode != OPCODE_TEXT {
            return Some(format!(
                "unsupported opcode {:#x} ({})",
                self.opcode,
                opcode_name(self.opcode)
            ));
        }
        if self.masked {
            return Some("masked server frame".to_owned());
        }
        if self.len > max_len as u64 {
            return Some(format!("payload of {} bytes exceeds {max_len}", self.len));
        }
        None
    }
}

fn opcode_name(opcode: u8) -> &'static str {
    match opcode {
        0x0 => "continuation",
        0x1 => "text",
        0x2 => "binary",
        0x8 => "close",
        0x9 => "ping",
        0xA => "pong",
        _ => "reserved",
    }
}

// ============================================================================
// Unit
// ============================================================================

/// Shape of the unit last read into the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// One HTTP line, CRLF stripped.
    Line,
    /// One WebSocket text frame payload.
    Text,
}

// ============================================================================
// FrameReader
// ============================================================================

/// Reads one unit at a time into a single reusable buffer.
///
/// The buffer is cleared on every read and never grows past `max_unit_len`.
#[derive(Debug, Clone)]
pub struct FrameReader {
    buf: Vec<u8>,
    max_unit_len: usize,
    line_grace: Duration,
}

impl FrameReader {
    /// Creates a reader bounded to `max_unit_len` bytes per unit.
    ///
    /// `line_grace` is how long a line read waits for more bytes before
    /// treating the line as complete.
    #[must_use]
    pub fn new(max_unit_len: usize, line_grace: Duration) -> Self {
        Self {
            buf: Vec::new(),
            max_unit_len,
            line_grace,
        }
    }

    /// Raw bytes of the last unit.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Last unit as text, invalid UTF-8 replaced.
    #[inline]
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buf)
    }

    /// Returns `true` if the last unit was empty (blank line).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns `true` if more input is readable now or within the grace wait.
    pub async fn has_more<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<bool> {
        if transport.available()? > 0 {
            return Ok(true);
        }
        transport.wait_for_data(self.line_grace).await
    }

    /// Reads the next line or frame into the buffer.
    ///
    /// # Errors
    ///
    /// - [`Error::Frame`] for an unsupported frame; its payload is consumed so
    ///   the stream stays aligned on the next unit, unless it exceeds the unit
    ///   bound, in which case the transport is stopped
    /// - [`Error::ConnectionClosed`] if the stream ends inside a frame
    pub async fn read_unit<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<Unit> {
        self.buf.clear();
        let first = transport.read_byte().await?;

        if first == FIN_TEXT {
            self.read_frame(first, transport).await?;
            trace!(len = self.buf.len(), "Read text frame");
            return Ok(Unit::Text);
        }

        if first & FIN_BIT != 0 || first <= FRAGMENT_CEILING {
            let header = FrameHeader::read(first, transport).await?;
            self.skip_payload(&header, transport).await?;
            let reason = header
                .rejection(self.max_unit_len)
                .unwrap_or_else(|| format!("unexpected frame header {first:#04x}"));
            return Err(Error::frame(reason));
        }

        self.read_line(first, transport).await?;
        trace!(line = %self.text(), "Read line");
        Ok(Unit::Line)
    }

    async fn read_frame<T: Transport + ?Sized>(&mut self, first: u8, transport: &mut T) -> Result<()> {
        let header = FrameHeader::read(first, transport).await?;
        if let Some(reason) = header.rejection(self.max_unit_len) {
            self.skip_payload(&header, transport).await?;
            return Err(Error::frame(reason));
        }

        // Bounded by max_unit_len above.
        let len = header.len as usize;
        self.buf.reserve(len);
        for _ in 0..len {
            self.buf.push(transport.read_byte().await?);
        }
        Ok(())
    }

    async fn read_line<T: Transport + ?Sized>(&mut self, first: u8, transport: &mut T) -> Result<()> {
        let mut byte = first;
        let mut truncated = 0usize;

        loop {
            if byte == b'\r' {
                if self.has_more(transport).await? {
                    let next = transport.read_byte().await?;
                    if next != b'\n' {
                        trace!(byte = next, "Expected LF after CR");
                    }
                }
                break;
            }

            if self.buf.len() < self.max_unit_len {
                self.buf.push(byte);
            } else {
                truncated += 1;
            }

            if !self.has_more(transport).await? {
                break;
            }
            byte = transport.read_byte().await?;
        }

        if truncated > 0 {
            warn!(
                truncated,
                max = self.max_unit_len,
                "Line exceeded buffer, excess discarded"
            );
        }
        Ok(())
    }

    /// Consumes the payload of a rejected frame.
    ///
    /// A payload larger than the unit bound is not drained: the connection
    /// is stopped instead, since the stream cannot be realigned cheaply.
    async fn skip_payload<T: Transport + ?Sized>(
        &self,
        header: &FrameHeader,
        transport: &mut T,
    ) -> Result<()> {
        if header.len > self.max_unit_len as u64 {
            warn!(
                len = header.len,
                max = self.max_unit_len,
                "Oversized frame, closing connection"
            );
            transport.stop().await;
            return Ok(());
        }
        Self::discard(header.len, transport).await
    }

    async fn discard<T: Transport + ?Sized>(len: u64, transport: &mut T) -> Result<()> {
        for _ in 0..len {
            transport.read_byte().await?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::transport::mock::MockTransport;

    fn reader() -> FrameReader {
        FrameReader::new(MAX_PAYLOAD, Duration::ZERO)
    }

    #[test]
    fn test_encode_short_frame() {
        let frame = encode_text_frame(b"2::").expect("encode");
        assert_eq!(frame, [0x81, 0x03, b'2', b':', b':']);
    }

    #[test]
    fn test_encode_extended_frame() {
        let payload = vec![b'x'; 126];
        let frame = encode_text_frame(&payload).expect("encode");
        assert_eq!(&frame[..4], &[0x81, 126, 0x00, 126]);
        assert_eq!(frame.len(), 130);

        let payload = vec![b'x'; 300];
        let frame = encode_text_frame(&payload).expect("encode");
        assert_eq!(&frame[..4], &[0x81, 126, 0x01, 0x2C]);
    }

    #[test]
    fn test_encode_boundary_125_stays_short() {
        let frame = encode_text_frame(&[b'a'; 125]).expect("encode");
        assert_eq!(frame[1], 125);
        assert_eq!(frame.len(), 127);
    }

    #[test]
    fn test_encode_too_large() {
        let payload = vec![0u8; MAX_PAYLOAD + 1];
        let err = encode_text_frame(&payload).expect_err("too large");
        assert!(matches!(err, Error::FrameTooLarge { len, .. } if len == MAX_PAYLOAD + 1));
    }

    #[tokio::test]
    async fn test_decode_extended_length() {
        let mut bytes = vec![0x81, 126, 0x00, 0x0A];
        bytes.extend_from_slice(b"0123456789");
        let mut transport = MockTransport::attached(bytes);
        let mut reader = reader();

        let unit = reader.read_unit(&mut transport).await.expect("decode");
        assert_eq!(unit, Unit::Text);
        assert_eq!(reader.bytes(), b"0123456789");
        assert_eq!(transport.available().expect("available"), 0);
    }

    #[tokio::test]
    async fn test_read_lines() {
        let mut transport =
            MockTransport::attached(b"HTTP/1.1 200 OK\r\nHost: x\r\n\r\nabc:60:25:websocket".to_vec());
        let mut reader = reader();

        assert_eq!(reader.read_unit(&mut transport).await.expect("line"), Unit::Line);
        assert_eq!(reader.text(), "HTTP/1.1 200 OK");
        reader.read_unit(&mut transport).await.expect("line");
        assert_eq!(reader.text(), "Host: x");
        reader.read_unit(&mut transport).await.expect("line");
        assert!(reader.is_empty());
        reader.read_unit(&mut transport).await.expect("line");
        assert_eq!(reader.text(), "abc:60:25:websocket");
    }

    #[tokio::test]
    async fn test_long_line_truncated() {
        let mut line = vec![b'a'; 20];
        line.extend_from_slice(b"\r\nnext");
        let mut transport = MockTransport::attached(line);
        let mut reader = FrameReader::new(8, Duration::ZERO);

        reader.read_unit(&mut transport).await.expect("line");
        assert_eq!(reader.bytes(), b"aaaaaaaa");
        reader.read_unit(&mut transport).await.expect("line");
        assert_eq!(reader.text(), "next");
    }

    #[tokio::test]
    async fn test_binary_frame_rejected_and_skipped() {
        let mut bytes = vec![0x82, 0x02, 0xDE, 0xAD];
        bytes.extend(encode_text_frame(b"2::").expect("encode"));
        let mut transport = MockTransport::attached(bytes);
        let mut reader = reader();

        let err = reader.read_unit(&mut transport).await.expect_err("binary");
        assert!(matches!(err, Error::Frame { .. }));
        assert!(err.to_string().contains("binary"));

        reader.read_unit(&mut transport).await.expect("next frame");
        assert_eq!(reader.bytes(), b"2::");
    }

    #[tokio::test]
    async fn test_fragmented_frame_rejected() {
        let mut bytes = vec![0x01, 0x02, b'5', b':'];
        bytes.extend_from_slice(&[0x80, 0x01, b':']);
        let mut transport = MockTransport::attached(bytes);
        let mut reader = reader();

        let err = reader.read_unit(&mut transport).await.expect_err("fragment");
        assert!(err.to_string().contains("fragmented"));
        let err = reader.read_unit(&mut transport).await.expect_err("continuation");
        assert!(err.to_string().contains("continuation"));
        assert_eq!(transport.available().expect("available"), 0);
    }

    #[tokio::test]
    async fn test_masked_frame_rejected() {
        let bytes = vec![0x81, 0x82, 1, 2, 3, 4, b'a', b'b'];
        let mut transport = MockTransport::attached(bytes);
        let mut reader = reader();

        let err = reader.read_unit(&mut transport).await.expect_err("masked");
        assert!(err.to_string().contains("masked"));
        assert_eq!(transport.available().expect("available"), 0);
    }

    #[tokio::test]
    async fn test_oversized_unsupported_frame_stops_transport() {
        let bytes = vec![0x82, 127, 0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xAB];
        let mut transport = MockTransport::attached(bytes);
        let mut reader = reader();

        let err = reader.read_unit(&mut transport).await.expect_err("oversized");
        assert!(matches!(err, Error::Frame { .. }));
        assert!(!transport.connected());
        assert_eq!(transport.stops, 1);
    }

    #[tokio::test]
    async fn test_oversized_text_frame_stops_transport() {
        let mut bytes = vec![0x81, 0x0A];
        bytes.extend_from_slice(b"0123456789");
        let mut transport = MockTransport::attached(bytes);
        let mut reader = FrameReader::new(4, Duration::ZERO);

        let err = reader.read_unit(&mut transport).await.expect_err("oversized");
        assert!(err.to_string().contains("exceeds 4"));
        assert!(reader.is_empty());
        assert!(!transport.connected());
        assert_eq!(transport.available().expect("available"), 0);
    }

    #[tokio::test]
    async fn test_truncated_frame_is_transport_error() {
        let mut transport = MockTransport::attached(vec![0x81, 0x05, b'a']);
        let err = reader()
            .read_unit(&mut transport)
            .await
            .expect_err("short read");
        assert!(matches!(err, Error::ConnectionClosed));
    }

    proptest! {
        #[test]
        fn prop_short_payload_survives_framing(payload in proptest::collection::vec(any::<u8>(), 0..=MAX_SHORT_PAYLOAD)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime");
            let frame = encode_text_frame(&payload).expect("encode");
            prop_assert_eq!(frame.len(), payload.len() + 2);

            let mut transport = MockTransport::attached(frame);
            let mut reader = reader();
            let unit = runtime.block_on(reader.read_unit(&mut transport)).expect("decode");
            prop_assert_eq!(unit, Unit::Text);
            prop_assert_eq!(reader.bytes(), payload.as_slice());
        }
    }
}
