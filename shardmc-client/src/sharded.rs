//! # Multi-Shard Facade
//!
//! Purpose: Route every keyed operation to its owning shard through the
//! consistent hash ring; fan out or target explicit endpoints for the
//! shard-wide operations.
//!
//! The ring is built once at construction and read concurrently without
//! synchronization; shard membership does not change over the client's
//! lifetime.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use shardmc_proto::{StatFilter, Status};

use crate::error::{ClientError, ClientResult};
use crate::payload::{JsonCodec, PayloadCodec};
use crate::ring::ConsistentHashRing;
use crate::shard::{CacheResult, ShardClient, ShardConfig};

/// Client spanning one or more shards.
///
/// Keyed operations resolve their shard via the ring and forward
/// unchanged. Thread safe.
pub struct ShardedClient<C = JsonCodec> {
    shards: Vec<Arc<ShardClient<C>>>,
    ring: ConsistentHashRing<Arc<ShardClient<C>>>,
}

impl ShardedClient<JsonCodec> {
    /// Builds a client over the given endpoints with default per-shard
    /// configuration and the JSON codec.
    pub fn connect<I, S>(addrs: I) -> ClientResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_configs(addrs.into_iter().map(ShardConfig::new).collect())
    }

    /// Builds a client with per-shard configuration and the JSON codec.
    pub fn with_configs(configs: Vec<ShardConfig>) -> ClientResult<Self> {
        Self::with_codec(configs, JsonCodec)
    }
}

impl<C: PayloadCodec + Clone> ShardedClient<C> {
    /// Builds a client with per-shard configuration and a custom codec.
    pub fn with_codec(configs: Vec<ShardConfig>, codec: C) -> ClientResult<Self> {
        if configs.is_empty() {
            return Err(ClientError::NoEndpoints);
        }
        let shards = configs
            .into_iter()
            .map(|config| Ok(Arc::new(ShardClient::with_codec(config, codec.clone())?)))
            .collect::<ClientResult<Vec<_>>>()?;
        let ring = ConsistentHashRing::with_nodes(shards.iter().cloned());
        Ok(ShardedClient { shards, ring })
    }
}

impl<C: PayloadCodec> ShardedClient<C> {
    /// Shards this client spans, in configuration order.
    pub fn shards(&self) -> &[Arc<ShardClient<C>>] {
        &self.shards
    }

    /// Fetches and decodes a value from the key's shard.
    pub fn get<T: DeserializeOwned + Default>(&self, key: &str) -> ClientResult<CacheResult<T>> {
        self.shard_for(key)?.get(key)
    }

    /// Fetches raw value bytes from the key's shard.
    pub fn get_raw(&self, key: &str) -> ClientResult<CacheResult<Vec<u8>>> {
        self.shard_for(key)?.get_raw(key)
    }

    /// Stores a value on the key's shard.
    pub fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        cas: u64,
    ) -> ClientResult<Status> {
        self.shard_for(key)?.set(key, value, ttl, cas)
    }

    /// Stores a value only if the key does not exist.
    pub fn add<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        cas: u64,
    ) -> ClientResult<Status> {
        self.shard_for(key)?.add(key, value, ttl, cas)
    }

    /// Stores a value only if the key already exists.
    pub fn replace<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        cas: u64,
    ) -> ClientResult<Status> {
        self.shard_for(key)?.replace(key, value, ttl, cas)
    }

    /// Removes a key from its shard.
    pub fn delete(&self, key: &str) -> ClientResult<Status> {
        self.shard_for(key)?.delete(key)
    }

    /// Expires every record on every shard.
    pub fn flush(&self, ttl: Duration) -> ClientResult<()> {
        for shard in &self.shards {
            shard.flush(ttl)?;
        }
        Ok(())
    }

    /// Resets a key's expiry on its shard.
    pub fn touch(&self, key: &str, ttl: Duration) -> ClientResult<Status> {
        self.shard_for(key)?.touch(key, ttl)
    }

    /// Fetches a value and resets its expiry in one round trip.
    pub fn get_and_touch<T: DeserializeOwned + Default>(
        &self,
        key: &str,
        ttl: Duration,
    ) -> ClientResult<CacheResult<T>> {
        self.shard_for(key)?.get_and_touch(key, ttl)
    }

    /// Version of one explicit shard, bypassing the ring.
    pub fn version(&self, addr: &str) -> ClientResult<CacheResult<String>> {
        self.shard_at(addr)?.version()
    }

    /// Statistics of one explicit shard, bypassing the ring.
    pub fn stat(&self, addr: &str, filter: StatFilter) -> ClientResult<Vec<(String, String)>> {
        self.shard_at(addr)?.stat(filter)
    }

    fn shard_for(&self, key: &str) -> ClientResult<&Arc<ShardClient<C>>> {
        let shard = self.ring.resolve(key).ok_or(ClientError::NoEndpoints)?;
        trace!(key, endpoint = %shard.endpoint(), "key routed");
        Ok(shard)
    }

    fn shard_at(&self, addr: &str) -> ClientResult<&Arc<ShardClient<C>>> {
        let endpoint: SocketAddr = addr
            .parse()
            .map_err(|_| ClientError::InvalidAddress(addr.to_string()))?;
        self.shards
            .iter()
            .find(|shard| shard.endpoint() == endpoint)
            .ok_or(ClientError::UnknownEndpoint(endpoint))
    }
}
