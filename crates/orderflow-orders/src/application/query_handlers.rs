//! Query handlers for the order context.
//!
//! Reads are served cache-aside: the cache is consulted first, the store on
//! a miss, and the cache is repopulated from whatever the store returned.
//! The cache is never authoritative, so every cache failure degrades to a
//! store read.

use orderflow_core::cache::OrderCache;
use orderflow_core::error::DomainError;
use orderflow_core::order::Order;
use orderflow_core::repository::OrderRepository;
use tracing::{debug, instrument, warn};

/// Retrieves an order owned by `customer_id`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the order does not exist or belongs to
/// another customer, and `DomainError::Persist` if the store fails.
#[instrument(skip(cache, repo))]
pub async fn get_order_by_id(
    order_uid: &str,
    customer_id: &str,
    cache: &dyn OrderCache,
    repo: &dyn OrderRepository,
) -> Result<Order, DomainError> {
    match cache.get(order_uid).await {
        Ok(Some(order)) if order.customer_id == customer_id => {
            debug!("cache hit");
            return Ok(order);
        }
        // Orders never change owner, so the store would answer the same.
        Ok(Some(_)) => return Err(DomainError::NotFound(order_uid.to_owned())),
        Ok(None) => debug!("cache miss"),
        Err(e) => warn!(error = %e, "cache read failed, falling back to store"),
    }

    let order = repo
        .get_by_id(order_uid, customer_id)
        .await?
        .ok_or_else(|| DomainError::NotFound(order_uid.to_owned()))?;

    if let Err(e) = cache.set(&order).await {
        warn!(error = %e, "failed to cache order");
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use orderflow_core::cache::OrderCache;
    use orderflow_core::clock::Clock;
    use orderflow_core::error::{DomainError, PersistError};
    use orderflow_test_support::{
        FailingOrderCache, FailingOrderRepository, FixedClock, InMemoryOrderCache,
        InMemoryOrderRepository, ManualClock, fixed_now, sample_order,
    };

    use crate::application::query_handlers::get_order_by_id;

    fn fixed_cache() -> InMemoryOrderCache {
        InMemoryOrderCache::new(Arc::new(FixedClock(fixed_now())))
    }

    #[tokio::test]
    async fn test_miss_reads_store_and_populates_cache() {
        // Arrange
        let order = sample_order("u1", "42");
        let repo = InMemoryOrderRepository::with_orders(vec![order.clone()]);
        let cache = fixed_cache();

        // Act
        let loaded = get_order_by_id("u1", "42", &cache, &repo).await.unwrap();

        // Assert
        assert_eq!(loaded, order);
        assert_eq!(repo.get_calls(), 1);
        assert!(cache.contains("u1"));
    }

    #[tokio::test]
    async fn test_hit_within_ttl_skips_store_and_refetches_after_expiry() {
        // Arrange
        let clock = Arc::new(ManualClock::new(fixed_now()));
        let cache = InMemoryOrderCache::new(clock.clone() as Arc<dyn Clock>);
        let repo = InMemoryOrderRepository::with_orders(vec![sample_order("u1", "42")]);
        get_order_by_id("u1", "42", &cache, &repo).await.unwrap();

        // Act: within the hour the store is not consulted again.
        clock.advance(Duration::minutes(59));
        get_order_by_id("u1", "42", &cache, &repo).await.unwrap();
        let calls_within_ttl = repo.get_calls();

        clock.advance(Duration::minutes(2));
        get_order_by_id("u1", "42", &cache, &repo).await.unwrap();

        // Assert
        assert_eq!(calls_within_ttl, 1);
        assert_eq!(repo.get_calls(), 2);
        assert_eq!(cache.set_calls(), 2);
    }

    #[tokio::test]
    async fn test_cached_order_of_another_customer_is_not_found() {
        // Arrange
        let cache = fixed_cache();
        cache.set(&sample_order("u1", "42")).await.unwrap();
        let repo = InMemoryOrderRepository::new();

        // Act
        let result = get_order_by_id("u1", "7", &cache, &repo).await;

        // Assert
        assert!(matches!(result, Err(DomainError::NotFound(uid)) if uid == "u1"));
        assert_eq!(repo.get_calls(), 0);
    }

    #[tokio::test]
    async fn test_stored_order_of_another_customer_is_not_found() {
        let repo = InMemoryOrderRepository::with_orders(vec![sample_order("u1", "42")]);
        let cache = fixed_cache();

        let result = get_order_by_id("u1", "7", &cache, &repo).await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
        assert!(!cache.contains("u1"));
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let result =
            get_order_by_id("missing", "42", &fixed_cache(), &InMemoryOrderRepository::new())
                .await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cache_failure_falls_back_to_store() {
        let order = sample_order("u1", "42");
        let repo = InMemoryOrderRepository::with_orders(vec![order.clone()]);

        let loaded = get_order_by_id("u1", "42", &FailingOrderCache, &repo)
            .await
            .unwrap();

        assert_eq!(loaded, order);
        assert_eq!(repo.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_is_surfaced() {
        let result = get_order_by_id(
            "u1",
            "42",
            &fixed_cache(),
            &FailingOrderRepository::Unavailable,
        )
        .await;

        assert!(matches!(
            result,
            Err(DomainError::Persist(PersistError::Unavailable(_)))
        ));
    }
}
