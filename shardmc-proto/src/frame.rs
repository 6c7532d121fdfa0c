//! # Frame Codec
//!
//! Purpose: Build outbound request frames and parse inbound response
//! frames against the fixed 24-byte binary header layout.
//!
//! ## Design Principles
//! 1. **Bit-For-Bit Layout**: Header offsets match the remote server
//!    exactly; see the offset table on [`RequestFrame::encode`].
//! 2. **Immutable Requests**: A request is built once and serialized to
//!    exactly one wire frame.
//! 3. **Lazy Responses**: A response is a parsed view over one received
//!    packet; fields are decoded on access.
//! 4. **Length Caps**: Wire-claimed body lengths beyond [`MAX_FRAME_BODY`]
//!    are rejected before allocation.

use thiserror::Error;

use crate::buffer::ByteBuffer;
use crate::command::{Opcode, StatFilter};
use crate::status::Status;

/// Fixed header size for requests and responses.
pub const HEADER_LEN: usize = 24;

/// Magic byte opening every request frame.
pub const REQUEST_MAGIC: u8 = 0x80;

/// Minimum buffered bytes before the total-body field can be read.
const BODY_LEN_AVAILABLE: usize = 12;

/// Upper bound on a claimed response body (16 MiB).
///
/// The wire field is attacker-controlled; anything above this is treated
/// as a framing error instead of an allocation request.
pub const MAX_FRAME_BODY: u32 = 16 * 1024 * 1024;

/// Framing failures while splitting a byte stream into frames.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("claimed frame body of {0} bytes exceeds the {MAX_FRAME_BODY} byte limit")]
    OversizedBody(u32),
}

/// One outbound request, immutable once constructed.
///
/// Optional extras follow the header as flags (4 bytes) and/or expiry
/// (4 bytes), then key, then value. A CAS of 0 means "ignore" and is not
/// written to the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    opcode: Opcode,
    key: Option<Vec<u8>>,
    flags: Option<u32>,
    expiry: Option<u32>,
    value: Option<Vec<u8>>,
    cas: u64,
}

impl RequestFrame {
    /// Get: key only, no extras, no value.
    pub fn get(key: &str) -> Self {
        RequestFrame {
            opcode: Opcode::Get,
            key: Some(key.as_bytes().to_vec()),
            flags: None,
            expiry: None,
            value: None,
            cas: 0,
        }
    }

    /// Store (Set/Add/Replace): key, 8 extras bytes (flags 0 + expiry),
    /// value, optional CAS.
    pub fn store(opcode: Opcode, key: &str, value: Vec<u8>, expiry_secs: u32, cas: u64) -> Self {
        debug_assert!(matches!(
            opcode,
            Opcode::Set | Opcode::Add | Opcode::Replace
        ));
        RequestFrame {
            opcode,
            key: Some(key.as_bytes().to_vec()),
            flags: Some(0),
            expiry: Some(expiry_secs),
            value: Some(value),
            cas,
        }
    }

    /// Delete: key only.
    pub fn delete(key: &str) -> Self {
        RequestFrame {
            opcode: Opcode::Delete,
            key: Some(key.as_bytes().to_vec()),
            flags: None,
            expiry: None,
            value: None,
            cas: 0,
        }
    }

    /// Flush: expiry extra only, no key, no value.
    pub fn flush(expiry_secs: u32) -> Self {
        RequestFrame {
            opcode: Opcode::Flush,
            key: None,
            flags: None,
            expiry: Some(expiry_secs),
            value: None,
            cas: 0,
        }
    }

    /// Touch: key plus expiry extra.
    pub fn touch(key: &str, expiry_secs: u32) -> Self {
        RequestFrame {
            opcode: Opcode::Touch,
            key: Some(key.as_bytes().to_vec()),
            flags: None,
            expiry: Some(expiry_secs),
            value: None,
            cas: 0,
        }
    }

    /// Get-and-touch: key plus expiry extra.
    pub fn get_and_touch(key: &str, expiry_secs: u32) -> Self {
        RequestFrame {
            opcode: Opcode::Gat,
            key: Some(key.as_bytes().to_vec()),
            flags: None,
            expiry: Some(expiry_secs),
            value: None,
            cas: 0,
        }
    }

    /// Version: bare header.
    pub fn version() -> Self {
        RequestFrame {
            opcode: Opcode::Version,
            key: None,
            flags: None,
            expiry: None,
            value: None,
            cas: 0,
        }
    }

    /// Stat: optional filter name as the key.
    pub fn stat(filter: StatFilter) -> Self {
        RequestFrame {
            opcode: Opcode::Stat,
            key: filter.as_key().map(<[u8]>::to_vec),
            flags: None,
            expiry: None,
            value: None,
            cas: 0,
        }
    }

    /// Opcode this request carries.
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Serializes to one wire frame.
    ///
    /// ```text
    /// [0]     magic 0x80          [8:12]  total body length
    /// [1]     opcode              [12:16] opaque (zero)
    /// [2:4]   key length          [16:24] CAS (only when > 0)
    /// [4]     extras length       [24..]  extras, key, value
    /// [5:8]   reserved
    /// ```
    pub fn encode(&self) -> Vec<u8> {
        let extra_len = match (self.flags, self.expiry) {
            (Some(_), Some(_)) => 8,
            (Some(_), None) | (None, Some(_)) => 4,
            (None, None) => 0,
        };
        let key_len = self.key.as_ref().map_or(0, Vec::len);
        let value_len = self.value.as_ref().map_or(0, Vec::len);
        let total_body = extra_len + key_len + value_len;

        let mut packet = vec![0u8; HEADER_LEN + total_body];
        packet[0] = REQUEST_MAGIC;
        packet[1] = self.opcode.as_u8();
        packet[2..4].copy_from_slice(&(key_len as u16).to_be_bytes());
        packet[4] = extra_len as u8;
        packet[8..12].copy_from_slice(&(total_body as u32).to_be_bytes());
        if self.cas > 0 {
            packet[16..24].copy_from_slice(&self.cas.to_be_bytes());
        }

        let mut cursor = HEADER_LEN;
        match (self.flags, self.expiry) {
            (Some(flags), Some(expiry)) => {
                packet[cursor..cursor + 4].copy_from_slice(&flags.to_be_bytes());
                packet[cursor + 4..cursor + 8].copy_from_slice(&expiry.to_be_bytes());
            }
            (None, Some(single)) | (Some(single), None) => {
                packet[cursor..cursor + 4].copy_from_slice(&single.to_be_bytes());
            }
            (None, None) => {}
        }
        cursor += extra_len;

        if let Some(key) = &self.key {
            packet[cursor..cursor + key_len].copy_from_slice(key);
            cursor += key_len;
        }
        if let Some(value) = &self.value {
            packet[cursor..cursor + value_len].copy_from_slice(value);
        }

        packet
    }
}

/// Parsed view over one complete received frame.
///
/// Field accessors read the fixed header offsets each time; key and value
/// bytes are copied only when asked for.
#[derive(Debug)]
pub struct ResponseFrame {
    packet: ByteBuffer,
}

impl ResponseFrame {
    /// Wraps one complete packet (header plus claimed body).
    pub fn from_packet(packet: Vec<u8>) -> Self {
        debug_assert!(packet.len() >= HEADER_LEN);
        ResponseFrame {
            packet: ByteBuffer::from_vec(packet),
        }
    }

    /// Extracts the next complete frame from the reassembly buffer.
    ///
    /// Returns `Ok(None)` while the buffer holds less than a full frame.
    /// A frame is complete once `total body + 24` bytes for it are
    /// available; the cut consumes it from the front of the buffer.
    pub fn next_from(buffer: &mut ByteBuffer) -> Result<Option<ResponseFrame>, FrameError> {
        if buffer.len() < BODY_LEN_AVAILABLE {
            return Ok(None);
        }
        let body = buffer.peek_u32(8);
        if body > MAX_FRAME_BODY {
            return Err(FrameError::OversizedBody(body));
        }
        let packet_len = HEADER_LEN + body as usize;
        if packet_len > buffer.len() {
            return Ok(None);
        }
        Ok(Some(ResponseFrame::from_packet(buffer.read_exact(packet_len))))
    }

    /// Raw opcode byte.
    pub fn raw_opcode(&self) -> u8 {
        self.packet.peek_u8(1)
    }

    /// Opcode, `None` for bytes outside the table.
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_u8(self.raw_opcode())
    }

    /// Key length from the header.
    pub fn key_len(&self) -> u16 {
        self.packet.peek_u16(2)
    }

    /// Extras length from the header.
    pub fn extra_len(&self) -> u8 {
        self.packet.peek_u8(4)
    }

    /// Raw status code.
    pub fn status_code(&self) -> u16 {
        self.packet.peek_u16(6)
    }

    /// Typed status.
    pub fn status(&self) -> Status {
        Status::from_u16(self.status_code())
    }

    /// Total body length (extras + key + value).
    pub fn total_body(&self) -> u32 {
        self.packet.peek_u32(8)
    }

    /// CAS token echoed by the server.
    pub fn cas(&self) -> u64 {
        self.packet.peek_u64(16)
    }

    /// Key bytes, starting after the extras.
    pub fn key(&self) -> Vec<u8> {
        let offset = HEADER_LEN + self.extra_len() as usize;
        self.packet.snapshot(offset, self.key_len() as usize)
    }

    /// Value bytes, from after the key to the end of the body.
    pub fn value(&self) -> Vec<u8> {
        let offset = HEADER_LEN + self.extra_len() as usize + self.key_len() as usize;
        self.packet.snapshot_from(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_packet(
        opcode: Opcode,
        status: u16,
        cas: u64,
        extras: &[u8],
        key: &[u8],
        value: &[u8],
    ) -> Vec<u8> {
        let total_body = extras.len() + key.len() + value.len();
        let mut packet = vec![0u8; HEADER_LEN + total_body];
        packet[0] = 0x81;
        packet[1] = opcode.as_u8();
        packet[2..4].copy_from_slice(&(key.len() as u16).to_be_bytes());
        packet[4] = extras.len() as u8;
        packet[6..8].copy_from_slice(&status.to_be_bytes());
        packet[8..12].copy_from_slice(&(total_body as u32).to_be_bytes());
        packet[16..24].copy_from_slice(&cas.to_be_bytes());
        let mut cursor = HEADER_LEN;
        for part in [extras, key, value] {
            packet[cursor..cursor + part.len()].copy_from_slice(part);
            cursor += part.len();
        }
        packet
    }

    #[test]
    fn get_request_layout() {
        let packet = RequestFrame::get("abc").encode();
        assert_eq!(packet.len(), 27);
        assert_eq!(packet[0], REQUEST_MAGIC);
        assert_eq!(packet[1], 0x00);
        assert_eq!(&packet[2..4], &[0, 3]);
        assert_eq!(packet[4], 0);
        assert_eq!(&packet[8..12], &[0, 0, 0, 3]);
        assert_eq!(&packet[16..24], &[0u8; 8]);
        assert_eq!(&packet[24..], b"abc");
    }

    #[test]
    fn store_request_layout() {
        let packet =
            RequestFrame::store(Opcode::Set, "k", b"vv".to_vec(), 0x0102, 0).encode();
        // 24 header + 8 extras + 1 key + 2 value
        assert_eq!(packet.len(), 35);
        assert_eq!(packet[1], 0x01);
        assert_eq!(packet[4], 8);
        assert_eq!(&packet[8..12], &[0, 0, 0, 11]);
        // flags 0 then expiry, both big-endian
        assert_eq!(&packet[24..28], &[0, 0, 0, 0]);
        assert_eq!(&packet[28..32], &[0, 0, 0x01, 0x02]);
        assert_eq!(packet[32], b'k');
        assert_eq!(&packet[33..35], b"vv");
    }

    #[test]
    fn cas_written_only_when_positive() {
        let without = RequestFrame::store(Opcode::Set, "k", Vec::new(), 1, 0).encode();
        assert_eq!(&without[16..24], &[0u8; 8]);

        let with = RequestFrame::store(Opcode::Replace, "k", Vec::new(), 1, 0x0102030405060708).encode();
        assert_eq!(&with[16..24], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn flush_carries_only_the_expiry_extra() {
        let packet = RequestFrame::flush(30).encode();
        assert_eq!(packet.len(), 28);
        assert_eq!(packet[1], 0x08);
        assert_eq!(packet[4], 4);
        assert_eq!(&packet[24..28], &[0, 0, 0, 30]);
    }

    #[test]
    fn version_is_a_bare_header() {
        let packet = RequestFrame::version().encode();
        assert_eq!(packet.len(), HEADER_LEN);
        assert_eq!(packet[1], 0x0b);
    }

    #[test]
    fn stat_filter_becomes_the_key() {
        let packet = RequestFrame::stat(StatFilter::Slabs).encode();
        assert_eq!(&packet[24..], b"slabs");
        let bare = RequestFrame::stat(StatFilter::All).encode();
        assert_eq!(bare.len(), HEADER_LEN);
    }

    #[test]
    fn response_fields_read_back() {
        let packet = response_packet(Opcode::Gat, 0x0001, 99, &[0, 0, 0, 7], b"key", b"value");
        let frame = ResponseFrame::from_packet(packet);
        assert_eq!(frame.opcode(), Some(Opcode::Gat));
        assert_eq!(frame.key_len(), 3);
        assert_eq!(frame.extra_len(), 4);
        assert_eq!(frame.status(), Status::KeyNotFound);
        assert_eq!(frame.total_body(), 12);
        assert_eq!(frame.cas(), 99);
        assert_eq!(frame.key(), b"key");
        assert_eq!(frame.value(), b"value");
    }

    #[test]
    fn request_round_trips_through_response_parse() {
        // Response layout shares the request offsets, so an encoded store
        // request parses back with its fields intact (status aside).
        let request = RequestFrame::store(Opcode::Set, "key", b"payload".to_vec(), 60, 5);
        let frame = ResponseFrame::from_packet(request.encode());
        assert_eq!(frame.opcode(), Some(Opcode::Set));
        assert_eq!(frame.extra_len(), 8);
        assert_eq!(frame.cas(), 5);
        assert_eq!(frame.key(), b"key");
        assert_eq!(frame.value(), b"payload");
    }

    #[test]
    fn incomplete_frames_stay_buffered() {
        let packet = response_packet(Opcode::Get, 0, 1, &[], b"", b"data");
        let mut buffer = ByteBuffer::new(64);

        buffer.append(&packet[..10]);
        assert!(ResponseFrame::next_from(&mut buffer).unwrap().is_none());

        buffer.append(&packet[10..20]);
        assert!(ResponseFrame::next_from(&mut buffer).unwrap().is_none());

        buffer.append(&packet[20..]);
        let frame = ResponseFrame::next_from(&mut buffer).unwrap().unwrap();
        assert_eq!(frame.value(), b"data");
        assert!(buffer.is_empty());
    }

    #[test]
    fn two_frames_in_one_buffer_split_cleanly() {
        let first = response_packet(Opcode::Stat, 0, 0, &[], b"pid", b"1");
        let second = response_packet(Opcode::Stat, 0, 0, &[], b"", b"");
        let mut buffer = ByteBuffer::new(64);
        buffer.append(&first);
        buffer.append(&second);

        let a = ResponseFrame::next_from(&mut buffer).unwrap().unwrap();
        assert_eq!(a.key(), b"pid");
        let b = ResponseFrame::next_from(&mut buffer).unwrap().unwrap();
        assert_eq!(b.total_body(), 0);
        assert!(ResponseFrame::next_from(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn oversized_claimed_body_is_rejected() {
        let mut packet = response_packet(Opcode::Get, 0, 0, &[], b"", b"");
        packet[8..12].copy_from_slice(&(MAX_FRAME_BODY + 1).to_be_bytes());
        let mut buffer = ByteBuffer::new(64);
        buffer.append(&packet);
        assert!(matches!(
            ResponseFrame::next_from(&mut buffer),
            Err(FrameError::OversizedBody(_))
        ));
    }
}
