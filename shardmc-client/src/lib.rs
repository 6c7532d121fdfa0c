//! # Sharded Cache Client
//!
//! Purpose: Provide a synchronous, connection-pooled client for the
//! binary key-value cache protocol, with consistent-hash routing across
//! multiple shards.
//!
//! ## Design Principles
//! 1. **Object Pool Pattern**: Each shard keeps a fixed set of reusable
//!    TCP connections; callers block, never fail, on exhaustion.
//! 2. **Exclusive Ownership**: A connection is held by exactly one caller
//!    for one request/response round trip.
//! 3. **Deterministic Routing**: The hash ring maps a key to the same
//!    shard every time, with minimal remapping on membership change.
//! 4. **Opaque Payloads**: Value bytes pass through a pluggable codec;
//!    the protocol layer never inspects them.

mod connection;
mod error;
mod payload;
mod pool;
mod shard;
mod sharded;

pub mod hash;
pub mod ring;

pub use connection::Connection;
pub use error::{ClientError, ClientResult};
pub use payload::{JsonCodec, PayloadCodec};
pub use pool::{ConnectionPool, PoolConfig, PooledConnection};
pub use ring::{ConsistentHashRing, RingNode};
pub use shard::{CacheResult, ShardClient, ShardConfig};
pub use sharded::ShardedClient;

pub use shardmc_proto::{Opcode, StatFilter, Status};
