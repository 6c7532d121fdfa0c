//! Client error taxonomy.
//!
//! Transport and framing failures are errors; protocol status codes are
//! not. A non-zero status travels in [`crate::CacheResult`] so callers can
//! branch on it without unwinding.

use thiserror::Error;

use shardmc_proto::FrameError;

/// Result type for all client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Socket connect/read/write failure. The connection is torn down and
    /// lazily rebuilt on next use.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stream could not be split into well-formed frames.
    #[error("framing error: {0}")]
    Frame(#[from] FrameError),

    /// A well-formed-looking response violated a protocol expectation.
    #[error("protocol error: {0}")]
    Protocol(&'static str),

    /// Payload serialization failed before anything was sent.
    #[error("payload encode failed: {0}")]
    Encode(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Endpoint string could not be parsed into a socket address.
    #[error("invalid endpoint address: {0}")]
    InvalidAddress(String),

    /// Client was constructed without any shard endpoints.
    #[error("no shard endpoints configured")]
    NoEndpoints,

    /// Endpoint-addressed operation named a shard this client does not own.
    #[error("endpoint {0} is not part of this client")]
    UnknownEndpoint(std::net::SocketAddr),
}
