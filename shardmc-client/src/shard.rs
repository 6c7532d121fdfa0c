//! # Per-Shard Client API
//!
//! Purpose: Expose the cache operations against a single shard, hiding
//! pooling and framing behind typed results.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: Every operation is acquire, build, send,
//!    decode, release; release happens on every exit path via the pool
//!    guard.
//! 2. **Status Is Data**: Server status codes travel in the result, never
//!    as an error.
//! 3. **Best-Effort Typed Reads**: A payload that fails to decode yields
//!    the type's default, not a fault.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use shardmc_proto::{Opcode, RequestFrame, StatFilter, Status};

use crate::connection::Connection;
use crate::error::{ClientError, ClientResult};
use crate::payload::{JsonCodec, PayloadCodec};
use crate::pool::{ConnectionPool, PoolConfig, DEFAULT_POOL_SIZE};
use crate::ring::RingNode;

/// Configuration for one shard and its pool.
#[derive(Debug, Clone)]
pub struct ShardConfig {
    /// Shard address, e.g. "127.0.0.1:11211".
    pub addr: String,
    /// Connections kept in the shard's pool.
    pub pool_size: usize,
    /// Optional TCP read timeout.
    pub read_timeout: Option<Duration>,
    /// Optional TCP write timeout.
    pub write_timeout: Option<Duration>,
    /// Optional TCP connect timeout.
    pub connect_timeout: Option<Duration>,
}

impl ShardConfig {
    /// Defaults: pool of 10, no socket timeouts.
    pub fn new(addr: impl Into<String>) -> Self {
        ShardConfig {
            addr: addr.into(),
            pool_size: DEFAULT_POOL_SIZE,
            read_timeout: None,
            write_timeout: None,
            connect_timeout: None,
        }
    }
}

/// Outcome of a get-shaped operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheResult<T> {
    /// Server status; check before trusting `value`.
    pub status: Status,
    /// Version token for conditional writes (0 when absent).
    pub cas: u64,
    /// Decoded value; the type default when missing or undecodable.
    pub value: T,
}

/// Client for one shard.
///
/// Thread safe; each operation borrows a pooled connection for exactly
/// one round trip.
pub struct ShardClient<C = JsonCodec> {
    endpoint: SocketAddr,
    pool: ConnectionPool,
    codec: C,
}

impl ShardClient<JsonCodec> {
    /// Connects with default configuration and the JSON codec.
    ///
    /// "Connects" is nominal: sockets are opened lazily on first use.
    pub fn connect(addr: impl Into<String>) -> ClientResult<Self> {
        Self::with_config(ShardConfig::new(addr))
    }

    /// Uses a custom configuration with the JSON codec.
    pub fn with_config(config: ShardConfig) -> ClientResult<Self> {
        Self::with_codec(config, JsonCodec)
    }
}

impl<C: PayloadCodec> ShardClient<C> {
    /// Uses a custom configuration and payload codec.
    pub fn with_codec(config: ShardConfig, codec: C) -> ClientResult<Self> {
        let endpoint: SocketAddr = config
            .addr
            .parse()
            .map_err(|_| ClientError::InvalidAddress(config.addr.clone()))?;
        let pool = ConnectionPool::new(PoolConfig {
            endpoint,
            size: config.pool_size,
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            connect_timeout: config.connect_timeout,
        });
        Ok(ShardClient {
            endpoint,
            pool,
            codec,
        })
    }

    /// Endpoint this client talks to.
    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    /// Fetches and decodes a value.
    pub fn get<T: DeserializeOwned + Default>(&self, key: &str) -> ClientResult<CacheResult<T>> {
        let raw = self.get_raw(key)?;
        Ok(self.decode_result(raw))
    }

    /// Fetches the raw value bytes.
    pub fn get_raw(&self, key: &str) -> ClientResult<CacheResult<Vec<u8>>> {
        let request = RequestFrame::get(key);
        let response = self.request(|conn| conn.round_trip(&request))?;
        Ok(CacheResult {
            status: response.status(),
            cas: response.cas(),
            value: response.value(),
        })
    }

    /// Stores a value unconditionally (or conditionally with `cas` > 0).
    pub fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        cas: u64,
    ) -> ClientResult<Status> {
        self.store(Opcode::Set, key, value, ttl, cas)
    }

    /// Stores a value only if the key does not exist.
    pub fn add<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        cas: u64,
    ) -> ClientResult<Status> {
        self.store(Opcode::Add, key, value, ttl, cas)
    }

    /// Stores a value only if the key already exists.
    pub fn replace<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        cas: u64,
    ) -> ClientResult<Status> {
        self.store(Opcode::Replace, key, value, ttl, cas)
    }

    /// Stores pre-encoded bytes.
    pub fn set_raw(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
        cas: u64,
    ) -> ClientResult<Status> {
        self.store_raw(Opcode::Set, key, value, ttl, cas)
    }

    /// Removes a key.
    pub fn delete(&self, key: &str) -> ClientResult<Status> {
        let request = RequestFrame::delete(key);
        let response = self.request(|conn| conn.round_trip(&request))?;
        Ok(response.status())
    }

    /// Expires every record after `ttl` (zero flushes immediately).
    pub fn flush(&self, ttl: Duration) -> ClientResult<Status> {
        let request = RequestFrame::flush(ttl_secs(ttl));
        let response = self.request(|conn| conn.round_trip(&request))?;
        Ok(response.status())
    }

    /// Resets a key's expiry. Not supported by every server build.
    pub fn touch(&self, key: &str, ttl: Duration) -> ClientResult<Status> {
        let request = RequestFrame::touch(key, ttl_secs(ttl));
        let response = self.request(|conn| conn.round_trip(&request))?;
        Ok(response.status())
    }

    /// Fetches a value and resets its expiry in one round trip.
    pub fn get_and_touch<T: DeserializeOwned + Default>(
        &self,
        key: &str,
        ttl: Duration,
    ) -> ClientResult<CacheResult<T>> {
        let raw = self.get_and_touch_raw(key, ttl)?;
        Ok(self.decode_result(raw))
    }

    /// Raw-bytes variant of [`Self::get_and_touch`].
    pub fn get_and_touch_raw(
        &self,
        key: &str,
        ttl: Duration,
    ) -> ClientResult<CacheResult<Vec<u8>>> {
        let request = RequestFrame::get_and_touch(key, ttl_secs(ttl));
        let response = self.request(|conn| conn.round_trip(&request))?;
        Ok(CacheResult {
            status: response.status(),
            cas: response.cas(),
            value: response.value(),
        })
    }

    /// Asks the server for its version string.
    pub fn version(&self) -> ClientResult<CacheResult<String>> {
        let request = RequestFrame::version();
        let response = self.request(|conn| conn.round_trip(&request))?;
        Ok(CacheResult {
            status: response.status(),
            cas: response.cas(),
            value: String::from_utf8_lossy(&response.value()).into_owned(),
        })
    }

    /// Fetches server statistics as an ordered key/value list.
    ///
    /// Each non-empty response frame contributes one pair; the empty
    /// terminator frame is dropped.
    pub fn stat(&self, filter: StatFilter) -> ClientResult<Vec<(String, String)>> {
        let request = RequestFrame::stat(filter);
        let responses = self.request(|conn| conn.send(&request))?;
        let mut pairs = Vec::new();
        for frame in responses {
            if frame.total_body() > 0 {
                pairs.push((
                    String::from_utf8_lossy(&frame.key()).into_owned(),
                    String::from_utf8_lossy(&frame.value()).into_owned(),
                ));
            }
        }
        Ok(pairs)
    }

    fn store<T: Serialize>(
        &self,
        opcode: Opcode,
        key: &str,
        value: &T,
        ttl: Duration,
        cas: u64,
    ) -> ClientResult<Status> {
        let bytes = self.codec.encode(value)?;
        self.store_raw(opcode, key, bytes, ttl, cas)
    }

    fn store_raw(
        &self,
        opcode: Opcode,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
        cas: u64,
    ) -> ClientResult<Status> {
        let request = RequestFrame::store(opcode, key, value, ttl_secs(ttl), cas);
        let response = self.request(|conn| conn.round_trip(&request))?;
        Ok(response.status())
    }

    fn decode_result<T: DeserializeOwned + Default>(
        &self,
        raw: CacheResult<Vec<u8>>,
    ) -> CacheResult<T> {
        CacheResult {
            status: raw.status,
            cas: raw.cas,
            value: self.codec.decode(&raw.value).unwrap_or_default(),
        }
    }

    fn request<T>(&self, op: impl FnOnce(&mut Connection) -> ClientResult<T>) -> ClientResult<T> {
        let mut conn = self.pool.acquire();
        trace!(endpoint = %self.endpoint, id = conn.id(), "connection leased");
        // Guard drop returns the connection whether `op` succeeds or not.
        op(&mut conn)
    }
}

/// Ring identity follows the endpoint string, so the same endpoint list
/// reproduces the same placement.
impl<C> RingNode for Arc<ShardClient<C>> {
    fn ring_identity(&self) -> String {
        self.endpoint.to_string()
    }
}

fn ttl_secs(ttl: Duration) -> u32 {
    ttl.as_secs() as u32
}
