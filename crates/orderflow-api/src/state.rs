//! Shared application state.

use std::sync::Arc;

use orderflow_core::cache::OrderCache;
use orderflow_core::clock::Clock;
use orderflow_core::publisher::OrderPublisher;
use orderflow_core::repository::OrderRepository;

/// Application state shared across all request handlers.
///
/// Every capability is a handle to a client constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Clock used to timestamp new orders.
    pub clock: Arc<dyn Clock>,
    /// Publisher for the orders topic.
    pub publisher: Arc<dyn OrderPublisher>,
    /// Topic new orders are appended to.
    pub orders_topic: Arc<str>,
    /// Read side of the store.
    pub order_repository: Arc<dyn OrderRepository>,
    /// Cache in front of the store.
    pub order_cache: Arc<dyn OrderCache>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("orders_topic", &self.orders_topic)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        publisher: Arc<dyn OrderPublisher>,
        orders_topic: impl Into<Arc<str>>,
        order_repository: Arc<dyn OrderRepository>,
        order_cache: Arc<dyn OrderCache>,
    ) -> Self {
        Self {
            clock,
            publisher,
            orders_topic: orders_topic.into(),
            order_repository,
            order_cache,
        }
    }
}
