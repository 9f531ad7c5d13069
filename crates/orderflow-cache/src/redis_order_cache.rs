//! Redis implementation of the `OrderCache` trait.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, instrument};

use orderflow_core::cache::{ORDER_CACHE_TTL, OrderCache, order_cache_key};
use orderflow_core::codec;
use orderflow_core::error::CacheError;
use orderflow_core::order::Order;

/// Redis-backed order cache over a shared, auto-reconnecting connection.
#[derive(Clone)]
pub struct RedisOrderCache {
    connection: ConnectionManager,
    ttl: Duration,
}

impl std::fmt::Debug for RedisOrderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisOrderCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl RedisOrderCache {
    /// Creates a cache over an existing connection manager.
    #[must_use]
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            ttl: ORDER_CACHE_TTL,
        }
    }

    /// Opens a connection manager for `url` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns the redis error if the URL is invalid or the first
    /// connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self::new(connection))
    }
}

#[async_trait]
impl OrderCache for RedisOrderCache {
    #[instrument(skip(self))]
    async fn get(&self, order_uid: &str) -> Result<Option<Order>, CacheError> {
        let mut connection = self.connection.clone();
        let raw: Option<Vec<u8>> = connection
            .get(order_cache_key(order_uid))
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        let entry = decode_entry(raw.as_deref())?;
        debug!(hit = entry.is_some(), "cache lookup");
        Ok(entry)
    }

    #[instrument(skip(self, order), fields(order_uid = %order.order_uid))]
    async fn set(&self, order: &Order) -> Result<(), CacheError> {
        let value = codec::encode(order).map_err(|e| CacheError::Corrupt(e.to_string()))?;
        let mut connection = self.connection.clone();
        connection
            .set_ex::<_, _, ()>(order_cache_key(&order.order_uid), value, self.ttl.as_secs())
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }
}

/// Turns a raw `GET` reply into a cache answer. A missing key is a miss;
/// an undecodable value is `Corrupt`, which callers treat as a miss.
fn decode_entry(raw: Option<&[u8]>) -> Result<Option<Order>, CacheError> {
    raw.map(|bytes| codec::decode(bytes).map_err(|e| CacheError::Corrupt(e.to_string())))
        .transpose()
}
