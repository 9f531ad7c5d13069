//! Persistence capability for the order aggregate.

use async_trait::async_trait;

use crate::error::PersistError;
use crate::order::Order;

/// Durable storage of orders.
///
/// The worker is the only caller of `create`; the read path is the only
/// caller of `get_by_id`.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores an order with its delivery, payment and items atomically.
    /// Either every row becomes visible or none does.
    async fn create(&self, order: &Order) -> Result<(), PersistError>;

    /// Loads an order owned by `customer_id`.
    ///
    /// Returns `Ok(None)` both when the order does not exist and when it
    /// belongs to another customer; the two cases are indistinguishable.
    async fn get_by_id(
        &self,
        order_uid: &str,
        customer_id: &str,
    ) -> Result<Option<Order>, PersistError>;
}
