//! Order fixtures.

use chrono::{DateTime, TimeZone, Utc};
use orderflow_core::order::{Delivery, Item, Order, Payment};

/// Fixed timestamp used across tests.
///
/// # Panics
///
/// Never; the literal date is valid.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// A valid line item with the given chart id.
#[must_use]
pub fn sample_item(chrt_id: i64, track_number: &str) -> Item {
    Item {
        chrt_id,
        track_number: track_number.to_owned(),
        price: 453,
        rid: format!("rid-{chrt_id}"),
        name: "Mascaras".to_owned(),
        sale: 30,
        size: "0".to_owned(),
        total_price: 317,
        nm_id: 2_389_212,
        brand: "Vivienne Sabo".to_owned(),
        status: 202,
    }
}

/// A valid single-item order owned by `customer_id`.
#[must_use]
pub fn sample_order(order_uid: &str, customer_id: &str) -> Order {
    let track_number = "WBILMTESTTRACK".to_owned();
    Order {
        order_uid: order_uid.to_owned(),
        track_number: track_number.clone(),
        entry: "WBIL".to_owned(),
        delivery: Delivery {
            name: "Test Testov".to_owned(),
            phone: "+9720000000".to_owned(),
            zip: "2639809".to_owned(),
            city: "Kiryat Mozkin".to_owned(),
            address: "Ploshad Mira 15".to_owned(),
            region: "Kraiot".to_owned(),
            email: "test@gmail.com".to_owned(),
        },
        payment: Payment {
            transaction: order_uid.to_owned(),
            request_id: String::new(),
            currency: "USD".to_owned(),
            provider: "wbpay".to_owned(),
            amount: 1817,
            payment_dt: fixed_now().timestamp(),
            bank: "alpha".to_owned(),
            delivery_cost: 1500,
            goods_total: 317,
            custom_fee: 0,
        },
        items: vec![sample_item(1, &track_number)],
        locale: "en".to_owned(),
        internal_signature: String::new(),
        customer_id: customer_id.to_owned(),
        delivery_service: "meest".to_owned(),
        shardkey: "9".to_owned(),
        sm_id: 99,
        date_created: fixed_now(),
        oof_shard: "1".to_owned(),
    }
}
