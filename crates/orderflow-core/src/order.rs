//! The `Order` aggregate and its owned entities.
//!
//! An order is created once by the API layer, travels through the queue as
//! an immutable snapshot, and is materialized into the store by the worker.
//! It is never updated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Inclusive upper bound of an item's sale percentage.
pub const MAX_SALE_PERCENT: i32 = 100;

/// Aggregate root: one customer order with its delivery, payment and items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Globally unique identifier assigned at creation.
    pub order_uid: String,
    /// Tracking number shared by the order and all its items.
    pub track_number: String,
    /// Entry point marker.
    pub entry: String,
    /// Recipient and address.
    pub delivery: Delivery,
    /// Payment details.
    pub payment: Payment,
    /// Ordered, non-empty list of line items.
    pub items: Vec<Item>,
    /// Customer locale.
    pub locale: String,
    /// Internal signature, usually empty.
    pub internal_signature: String,
    /// Identity of the owning customer.
    pub customer_id: String,
    /// Delivery service tag.
    pub delivery_service: String,
    /// Shard key.
    pub shardkey: String,
    /// Shard metadata.
    pub sm_id: i64,
    /// Creation timestamp (UTC, RFC3339 on the wire).
    pub date_created: DateTime<Utc>,
    /// Out-of-flow shard.
    pub oof_shard: String,
}

/// Delivery recipient and address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

/// Payment details. Amounts are minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub transaction: String,
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    /// `delivery_cost + goods_total` at creation time.
    pub amount: i64,
    /// Unix timestamp, seconds.
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

/// One line item of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    pub rid: String,
    pub name: String,
    /// Sale percentage, `0..=100`.
    pub sale: i32,
    pub size: String,
    pub total_price: i64,
    pub nm_id: i64,
    pub brand: String,
    pub status: i32,
}

impl Payment {
    /// The amount a payment must carry for the given costs, or `None` when
    /// the sum does not fit in an `i64`.
    #[must_use]
    pub fn expected_amount(delivery_cost: i64, goods_total: i64) -> Option<i64> {
        delivery_cost.checked_add(goods_total)
    }
}

impl Order {
    /// Checks the invariants every order must satisfy before it is published
    /// or persisted.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` naming the first violated invariant.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.order_uid.trim().is_empty() {
            return Err(invalid("order_uid must not be empty"));
        }
        if self.track_number.trim().is_empty() {
            return Err(invalid("track_number must not be empty"));
        }
        if self.customer_id.trim().is_empty() {
            return Err(invalid("customer_id must not be empty"));
        }
        if self.items.is_empty() {
            return Err(invalid("order must contain at least one item"));
        }
        // TIMESTAMPTZ keeps microseconds; anything finer would not survive a round trip.
        if self.date_created.timestamp_subsec_nanos() % 1_000 != 0 {
            return Err(invalid(
                "date_created must not be more precise than microseconds",
            ));
        }

        let payment = &self.payment;
        for (field, value) in [
            ("payment.amount", payment.amount),
            ("payment.delivery_cost", payment.delivery_cost),
            ("payment.goods_total", payment.goods_total),
            ("payment.custom_fee", payment.custom_fee),
        ] {
            if value < 0 {
                return Err(invalid(&format!("{field} must not be negative, got {value}")));
            }
        }
        let Some(expected) = Payment::expected_amount(payment.delivery_cost, payment.goods_total)
        else {
            return Err(invalid("payment.delivery_cost + payment.goods_total overflows"));
        };
        if payment.amount != expected {
            return Err(invalid(&format!(
                "payment.amount {} does not equal delivery_cost + goods_total ({expected})",
                payment.amount
            )));
        }

        for (index, item) in self.items.iter().enumerate() {
            if !(0..=MAX_SALE_PERCENT).contains(&item.sale) {
                return Err(invalid(&format!(
                    "items[{index}].sale must be within 0..=100, got {}",
                    item.sale
                )));
            }
            if item.price < 0 || item.total_price < 0 {
                return Err(invalid(&format!("items[{index}] prices must not be negative")));
            }
        }

        Ok(())
    }
}

fn invalid(message: &str) -> DomainError {
    DomainError::Validation(message.to_owned())
}
