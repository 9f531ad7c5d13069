//! Test repositories — mock `OrderRepository` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use orderflow_core::error::PersistError;
use orderflow_core::order::Order;
use orderflow_core::repository::OrderRepository;

/// An order repository backed by a vector. Enforces `order_uid` uniqueness
/// and owner filtering like the real store, and counts every call.
///
/// Can be configured to fail the first N `create` calls with a transient
/// error to exercise retry paths.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<Vec<Order>>,
    transient_failures: AtomicUsize,
    create_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl InMemoryOrderRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository whose first `failures` creates return
    /// `PersistError::Unavailable`.
    #[must_use]
    pub fn failing_first(failures: usize) -> Self {
        Self {
            transient_failures: AtomicUsize::new(failures),
            ..Self::default()
        }
    }

    /// Create a repository pre-populated with `orders`.
    #[must_use]
    pub fn with_orders(orders: Vec<Order>) -> Self {
        Self {
            orders: Mutex::new(orders),
            ..Self::default()
        }
    }

    /// Returns a snapshot of all stored orders, in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stored(&self) -> Vec<Order> {
        self.orders.lock().unwrap().clone()
    }

    /// Number of `create` calls, successful or not.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_by_id` calls.
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: &Order) -> Result<(), PersistError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(PersistError::Unavailable("connection reset".into()));
        }

        let mut orders = self.orders.lock().unwrap();
        if orders.iter().any(|o| o.order_uid == order.order_uid) {
            return Err(PersistError::Duplicate(order.order_uid.clone()));
        }
        orders.push(order.clone());
        Ok(())
    }

    async fn get_by_id(
        &self,
        order_uid: &str,
        customer_id: &str,
    ) -> Result<Option<Order>, PersistError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.order_uid == order_uid && o.customer_id == customer_id)
            .cloned())
    }
}

/// An order repository that always fails. `Unavailable` simulates an
/// outage; `Rejected` simulates a permanent constraint violation.
#[derive(Debug)]
pub enum FailingOrderRepository {
    /// Every call returns `PersistError::Unavailable`.
    Unavailable,
    /// Every call returns `PersistError::Rejected`.
    Rejected,
}

impl FailingOrderRepository {
    fn error(&self) -> PersistError {
        match self {
            Self::Unavailable => PersistError::Unavailable("connection refused".into()),
            Self::Rejected => PersistError::Rejected("check constraint violated".into()),
        }
    }
}

#[async_trait]
impl OrderRepository for FailingOrderRepository {
    async fn create(&self, _order: &Order) -> Result<(), PersistError> {
        Err(self.error())
    }

    async fn get_by_id(
        &self,
        _order_uid: &str,
        _customer_id: &str,
    ) -> Result<Option<Order>, PersistError> {
        Err(self.error())
    }
}
