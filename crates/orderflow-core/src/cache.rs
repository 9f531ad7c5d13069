//! Cache capability for single-order lookups.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;
use crate::order::Order;

/// How long a cached order stays readable after it was written.
pub const ORDER_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Returns the cache key for an order.
#[must_use]
pub fn order_cache_key(order_uid: &str) -> String {
    format!("order-{order_uid}")
}

/// TTL-bounded, non-authoritative order cache.
///
/// Absence is never an error. Entries are populated lazily by the read path
/// and expire only through their TTL.
#[async_trait]
pub trait OrderCache: Send + Sync {
    /// Returns the cached order, or `None` on a miss.
    async fn get(&self, order_uid: &str) -> Result<Option<Order>, CacheError>;

    /// Caches an order under its key for `ORDER_CACHE_TTL`.
    async fn set(&self, order: &Order) -> Result<(), CacheError>;
}
