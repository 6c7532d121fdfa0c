//! # Connection Pool
//!
//! Purpose: Bounded set of reusable connections to one shard with
//! lend/return discipline under concurrent access.
//!
//! ## Design Principles
//! 1. **Fixed Capacity**: All connections are created up front; none are
//!    added later, so the bound can never be exceeded.
//! 2. **Block, Don't Fail**: Exhaustion spins with cooperative yields
//!    until a connection frees up; hold times are one round trip.
//! 3. **Return On Every Path**: The RAII guard gives the connection back
//!    on drop, success or failure, so the pool never leaks a slot.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::trace;

use crate::connection::{Connection, SocketOptions};

/// Default number of connections per shard.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Spins before each yield while waiting on an exhausted pool.
const SPINS_BEFORE_YIELD: u32 = 64;

/// Pool configuration for one shard.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Shard endpoint.
    pub endpoint: SocketAddr,
    /// Number of connections to pre-populate.
    pub size: usize,
    /// Optional TCP read timeout.
    pub read_timeout: Option<Duration>,
    /// Optional TCP write timeout.
    pub write_timeout: Option<Duration>,
    /// Optional TCP connect timeout.
    pub connect_timeout: Option<Duration>,
}

impl PoolConfig {
    /// Default-sized pool with no socket timeouts.
    pub fn new(endpoint: SocketAddr) -> Self {
        PoolConfig {
            endpoint,
            size: DEFAULT_POOL_SIZE,
            read_timeout: None,
            write_timeout: None,
            connect_timeout: None,
        }
    }
}

struct PoolInner {
    // LIFO keeps recently used sockets warm.
    idle: Mutex<Vec<Connection>>,
}

/// Fixed-size, thread-safe pool of connections to one shard.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Creates the pool and pre-populates every slot.
    ///
    /// Connections are unconnected until first use; construction never
    /// touches the network.
    pub fn new(config: PoolConfig) -> Self {
        let options = SocketOptions {
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            connect_timeout: config.connect_timeout,
        };
        let idle = (0..config.size)
            .map(|id| Connection::new(id, config.endpoint, options))
            .collect();
        ConnectionPool {
            inner: Arc::new(PoolInner {
                idle: Mutex::new(idle),
            }),
        }
    }

    /// Takes a connection, blocking until one is available.
    ///
    /// The wait is a bounded spin with cooperative yields; there is no
    /// fairness guarantee and no timeout. A caller holding a connection
    /// indefinitely starves the pool by design of this layer.
    pub fn acquire(&self) -> PooledConnection {
        let mut spins = 0u32;
        loop {
            if let Some(conn) = self.pop_idle() {
                return PooledConnection::new(self.inner.clone(), conn);
            }
            if spins < SPINS_BEFORE_YIELD {
                spins += 1;
                std::hint::spin_loop();
            } else {
                trace!("pool exhausted, yielding");
                std::thread::yield_now();
            }
        }
    }

    fn pop_idle(&self) -> Option<Connection> {
        let mut idle = self.inner.idle.lock().expect("pool mutex poisoned");
        idle.pop()
    }
}

/// RAII wrapper returning the connection to its pool on drop.
///
/// Derefs to [`Connection`]; the holder has exclusive use until drop.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    conn: Option<Connection>,
}

impl PooledConnection {
    fn new(pool: Arc<PoolInner>, conn: Connection) -> Self {
        PooledConnection {
            pool,
            conn: Some(conn),
        }
    }
}

impl std::ops::Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl std::ops::DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            let mut idle = self.pool.idle.lock().expect("pool mutex poisoned");
            idle.push(conn);
        }
    }
}
