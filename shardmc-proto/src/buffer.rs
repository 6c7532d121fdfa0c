//! # Growable Byte Accumulator
//!
//! Purpose: Buffer incoming socket reads and serve frame parsing with a
//! read cursor, so partial frames can accumulate across reads without
//! shifting bytes on every consume.
//!
//! ## Design Principles
//! 1. **Cursor, Not Copy**: Consuming bytes advances `position`; the
//!    backing storage is untouched until the buffer is cleared.
//! 2. **Doubling Growth**: Capacity doubles until an append fits, and is
//!    never shrunk during normal operation.
//! 3. **Network Byte Order**: All multi-byte peeks are big-endian.
//! 4. **Single Owner**: Not thread safe; each connection owns its buffer.

/// Growable byte buffer with a read cursor.
///
/// `position` counts bytes already consumed, `len()` counts bytes still
/// valid from `position`. Peeks and reads index relative to `position`.
/// Offsets and lengths out of the valid range are caller bugs and panic.
#[derive(Debug)]
pub struct ByteBuffer {
    data: Vec<u8>,
    /// Capacity the buffer was created with; `hard_reset` returns to it.
    initial_capacity: usize,
    position: usize,
    length: usize,
}

impl ByteBuffer {
    /// Creates an empty buffer with the given starting capacity.
    pub fn new(capacity: usize) -> Self {
        ByteBuffer {
            data: vec![0; capacity],
            initial_capacity: capacity,
            position: 0,
            length: 0,
        }
    }

    /// Wraps an existing byte vector; all of it is valid data.
    pub fn from_vec(data: Vec<u8>) -> Self {
        let len = data.len();
        ByteBuffer {
            data,
            initial_capacity: len,
            position: 0,
            length: len,
        }
    }

    /// Number of valid bytes remaining from the read cursor.
    pub fn len(&self) -> usize {
        self.length
    }

    /// True when no valid bytes remain.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Bytes already consumed from the front.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Appends bytes after the valid region, doubling capacity as needed.
    pub fn append(&mut self, src: &[u8]) {
        let required = self.position + self.length + src.len();
        if required > self.data.len() {
            let mut capacity = self.data.len().max(1);
            while capacity < required {
                capacity *= 2;
            }
            self.data.resize(capacity, 0);
        }
        let start = self.position + self.length;
        self.data[start..start + src.len()].copy_from_slice(src);
        self.length += src.len();
    }

    /// Reads one byte at `position + offset` without consuming.
    pub fn peek_u8(&self, offset: usize) -> u8 {
        assert!(offset < self.length, "peek past valid data");
        self.data[self.position + offset]
    }

    /// Reads a big-endian u16 at `position + offset` without consuming.
    pub fn peek_u16(&self, offset: usize) -> u16 {
        let index = self.position + offset;
        assert!(offset + 2 <= self.length, "peek past valid data");
        u16::from_be_bytes([self.data[index], self.data[index + 1]])
    }

    /// Reads a big-endian u32 at `position + offset` without consuming.
    pub fn peek_u32(&self, offset: usize) -> u32 {
        let index = self.position + offset;
        assert!(offset + 4 <= self.length, "peek past valid data");
        u32::from_be_bytes([
            self.data[index],
            self.data[index + 1],
            self.data[index + 2],
            self.data[index + 3],
        ])
    }

    /// Reads a big-endian u64 at `position + offset` without consuming.
    pub fn peek_u64(&self, offset: usize) -> u64 {
        let index = self.position + offset;
        assert!(offset + 8 <= self.length, "peek past valid data");
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.data[index..index + 8]);
        u64::from_be_bytes(raw)
    }

    /// Copies out `len` bytes from the cursor and consumes them.
    pub fn read_exact(&mut self, len: usize) -> Vec<u8> {
        assert!(len <= self.length, "read past valid data");
        let start = self.position;
        let out = self.data[start..start + len].to_vec();
        self.position += len;
        self.length -= len;
        out
    }

    /// Copies out `len` bytes at an interior offset and closes the gap.
    ///
    /// The tail after the extracted range is moved left so the valid
    /// region stays contiguous. `offset == 0` degenerates to `read_exact`.
    pub fn read_exact_at(&mut self, len: usize, offset: usize) -> Vec<u8> {
        if offset == 0 {
            return self.read_exact(len);
        }
        assert!(offset + len <= self.length, "read past valid data");
        let start = self.position + offset;
        let out = self.data[start..start + len].to_vec();
        let tail = self.length - offset - len;
        self.data.copy_within(start + len..start + len + tail, start);
        self.length -= len;
        out
    }

    /// Copies `len` bytes at `position + offset` without moving cursors.
    pub fn snapshot(&self, offset: usize, len: usize) -> Vec<u8> {
        assert!(offset + len <= self.length, "snapshot past valid data");
        let start = self.position + offset;
        self.data[start..start + len].to_vec()
    }

    /// Copies everything from `position + offset` to the end of valid data.
    pub fn snapshot_from(&self, offset: usize) -> Vec<u8> {
        self.snapshot(offset, self.length - offset)
    }

    /// Zeroes the cursors without touching capacity.
    pub fn reset(&mut self) {
        self.position = 0;
        self.length = 0;
    }

    /// Returns the buffer to its original capacity, dropping grown storage.
    pub fn hard_reset(&mut self) {
        self.position = 0;
        self.length = 0;
        self.data = vec![0; self.initial_capacity];
    }
}
