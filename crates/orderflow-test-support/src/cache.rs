//! Test caches — mock `OrderCache` implementations for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use orderflow_core::cache::{ORDER_CACHE_TTL, OrderCache, order_cache_key};
use orderflow_core::clock::Clock;
use orderflow_core::error::CacheError;
use orderflow_core::order::Order;

/// An in-process cache that honours `ORDER_CACHE_TTL` against an injected
/// clock, so expiry can be tested with a `ManualClock`.
pub struct InMemoryOrderCache {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, (Order, DateTime<Utc>)>>,
    set_calls: AtomicUsize,
}

impl std::fmt::Debug for InMemoryOrderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryOrderCache")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl InMemoryOrderCache {
    /// Create an empty cache reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
            set_calls: AtomicUsize::new(0),
        }
    }

    /// Whether a live entry exists for `order_uid`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn contains(&self, order_uid: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .lock()
            .unwrap()
            .get(&order_cache_key(order_uid))
            .is_some_and(|(_, expires_at)| *expires_at > now)
    }

    /// Number of `set` calls.
    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderCache for InMemoryOrderCache {
    async fn get(&self, order_uid: &str) -> Result<Option<Order>, CacheError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();
        let key = order_cache_key(order_uid);
        match entries.get(&key) {
            Some((order, expires_at)) if *expires_at > now => Ok(Some(order.clone())),
            Some(_) => {
                entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, order: &Order) -> Result<(), CacheError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        let ttl = Duration::from_std(ORDER_CACHE_TTL).expect("cache TTL fits in chrono::Duration");
        let expires_at = self.clock.now() + ttl;
        self.entries
            .lock()
            .unwrap()
            .insert(order_cache_key(&order.order_uid), (order.clone(), expires_at));
        Ok(())
    }
}

/// A cache whose every call fails with a backend error.
#[derive(Debug)]
pub struct FailingOrderCache;

#[async_trait]
impl OrderCache for FailingOrderCache {
    async fn get(&self, _order_uid: &str) -> Result<Option<Order>, CacheError> {
        Err(CacheError::Backend("connection refused".into()))
    }

    async fn set(&self, _order: &Order) -> Result<(), CacheError> {
        Err(CacheError::Backend("connection refused".into()))
    }
}
