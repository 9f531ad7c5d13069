//! Commands for the order context.

use serde::Deserialize;
use uuid::Uuid;

/// Recipient and address supplied by the customer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDelivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

/// Payment details supplied by the customer. The total and the payment
/// timestamp are derived when the order is built.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPayment {
    pub currency: String,
    pub provider: String,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    #[serde(default)]
    pub custom_fee: i64,
}

/// One line item supplied by the customer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    pub chrt_id: i64,
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub sale: i32,
    pub size: String,
    pub brand: String,
    pub total_price: i64,
    pub nm_id: i64,
}

/// Command to submit a new order on behalf of an authenticated customer.
#[derive(Debug, Clone)]
pub struct SubmitOrder {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The authenticated caller who will own the order.
    pub customer_id: String,
    /// Where the order ships.
    pub delivery: NewDelivery,
    /// How the order is paid.
    pub payment: NewPayment,
    /// What was ordered, in submission order.
    pub items: Vec<NewItem>,
    /// Customer locale.
    pub locale: String,
    /// Requested delivery service.
    pub delivery_service: String,
}
