//! # Cache Wire Protocol
//!
//! Purpose: Frame construction and stream reassembly primitives for the
//! binary key-value cache protocol, shared by the per-shard and sharded
//! clients.
//!
//! ## Design Principles
//! 1. **No I/O Here**: Everything operates on in-memory byte ranges so the
//!    codec is testable without sockets.
//! 2. **Big-Endian Always**: Multi-byte wire fields are network byte order
//!    regardless of host order.
//! 3. **Lazy Parsing**: Response fields are computed from fixed header
//!    offsets on access, never copied up front.
//! 4. **Bounded Trust**: Claimed body lengths are capped before any
//!    allocation is sized from them.

pub mod buffer;
pub mod command;
pub mod frame;
pub mod status;

pub use buffer::ByteBuffer;
pub use command::{Opcode, StatFilter};
pub use frame::{FrameError, RequestFrame, ResponseFrame, HEADER_LEN, MAX_FRAME_BODY};
pub use status::Status;
