//! # Shard Connection
//!
//! Purpose: Own one socket to one shard; send a request frame and
//! reassemble one or more response frames from the byte stream.
//!
//! ## Design Principles
//! 1. **Lazy Lifecycle**: The socket is created on first use and rebuilt
//!    on the next use after a transport failure.
//! 2. **Reused Buffers**: A fixed scratch buffer and a growable
//!    reassembly buffer live on the connection, not per call.
//! 3. **Exclusive Use**: Not shared; the pool hands a connection to one
//!    caller at a time.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use tracing::{debug, trace};

use shardmc_proto::{Opcode, RequestFrame, ResponseFrame, ByteBuffer};

use crate::error::{ClientError, ClientResult};

/// Size of the per-connection socket read scratch buffer.
const SCRATCH_LEN: usize = 8 * 1024;

/// Socket timeout knobs shared by every connection of a pool.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SocketOptions {
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

/// One lazily connected socket plus its reassembly state.
pub struct Connection {
    id: usize,
    endpoint: SocketAddr,
    options: SocketOptions,
    stream: Option<TcpStream>,
    scratch: Box<[u8; SCRATCH_LEN]>,
    reassembly: ByteBuffer,
}

impl Connection {
    pub(crate) fn new(id: usize, endpoint: SocketAddr, options: SocketOptions) -> Self {
        Connection {
            id,
            endpoint,
            options,
            stream: None,
            scratch: Box::new([0u8; SCRATCH_LEN]),
            reassembly: ByteBuffer::new(SCRATCH_LEN),
        }
    }

    /// Stable identifier within the owning pool.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Endpoint this connection talks to.
    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    /// Sends one request and returns every response frame it produced.
    ///
    /// Single-response opcodes yield exactly one frame. Stat keeps
    /// consuming frames until the empty-body terminator or a non-success
    /// status (error stats are single-frame). On any transport error the
    /// socket is dropped and rebuilt lazily by the next call.
    pub fn send(&mut self, request: &RequestFrame) -> ClientResult<Vec<ResponseFrame>> {
        let result = self.send_inner(request);
        if result.is_err() {
            debug!(id = self.id, endpoint = %self.endpoint, "transport failure, dropping socket");
            self.stream = None;
        }
        result
    }

    /// Sends one request and returns the first response frame.
    pub fn round_trip(&mut self, request: &RequestFrame) -> ClientResult<ResponseFrame> {
        self.send(request)?
            .into_iter()
            .next()
            .ok_or(ClientError::Protocol("empty response sequence"))
    }

    fn send_inner(&mut self, request: &RequestFrame) -> ClientResult<Vec<ResponseFrame>> {
        self.ensure_connected()?;
        let Some(stream) = self.stream.as_mut() else {
            return Err(ClientError::Protocol("socket unavailable after connect"));
        };

        stream.write_all(&request.encode())?;
        self.reassembly.reset();
        let mut frames = Vec::new();

        loop {
            let read = stream.read(&mut self.scratch[..])?;
            if read == 0 {
                return Err(ClientError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "peer closed mid-response",
                )));
            }
            self.reassembly.append(&self.scratch[..read]);

            while let Some(frame) = ResponseFrame::next_from(&mut self.reassembly)? {
                trace!(
                    id = self.id,
                    opcode = frame.raw_opcode(),
                    body = frame.total_body(),
                    "frame received"
                );
                let done = frame.opcode() != Some(Opcode::Stat)
                    || frame.total_body() == 0
                    || !frame.status().is_success();
                frames.push(frame);
                if done {
                    return Ok(frames);
                }
            }
        }
    }

    fn ensure_connected(&mut self) -> ClientResult<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        debug!(id = self.id, endpoint = %self.endpoint, "connecting");
        let stream = match self.options.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(&self.endpoint, timeout)?,
            None => TcpStream::connect(self.endpoint)?,
        };
        stream.set_read_timeout(self.options.read_timeout)?;
        stream.set_write_timeout(self.options.write_timeout)?;
        // Requests are small; don't let Nagle sit on them.
        stream.set_nodelay(true)?;
        self.stream = Some(stream);
        Ok(())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("connected", &self.stream.is_some())
            .finish()
    }
}
