//! Builds a complete `Order` from a `SubmitOrder` command.

use chrono::SubsecRound;
use orderflow_core::clock::Clock;
use orderflow_core::order::{Delivery, Item, Order, Payment};
use uuid::Uuid;

use crate::domain::commands::{NewItem, SubmitOrder};

/// Entry point marker stamped on every order submitted through the API.
pub const ENTRY: &str = "WBIL";
/// Prefix of generated tracking numbers.
pub const TRACK_PREFIX: &str = "WB";
/// Status assigned to freshly submitted items.
pub const ITEM_STATUS_ACCEPTED: i32 = 202;

const SHARDKEY: &str = "9";
const SM_ID: i64 = 99;
const OOF_SHARD: &str = "1";
const TRACK_SUFFIX_LEN: usize = 10;

/// Assigns identifiers and derived fields to a submission.
///
/// The result is not validated; callers run `Order::validate` before the
/// order leaves the process. `date_created` is truncated to microseconds, the
/// precision Postgres stores. A delivery cost and goods total whose sum
/// overflows leave `payment.amount` at zero, which validation rejects.
#[must_use]
pub fn build_order(command: &SubmitOrder, clock: &dyn Clock) -> Order {
    let order_uid = Uuid::new_v4().to_string();
    let track_number = generate_track_number();
    let now = clock.now().trunc_subsecs(6);

    let payment = &command.payment;
    let delivery = &command.delivery;

    Order {
        order_uid: order_uid.clone(),
        track_number: track_number.clone(),
        entry: ENTRY.to_owned(),
        delivery: Delivery {
            name: delivery.name.clone(),
            phone: delivery.phone.clone(),
            zip: delivery.zip.clone(),
            city: delivery.city.clone(),
            address: delivery.address.clone(),
            region: delivery.region.clone(),
            email: delivery.email.clone(),
        },
        payment: Payment {
            transaction: order_uid,
            request_id: String::new(),
            currency: payment.currency.clone(),
            provider: payment.provider.clone(),
            amount: Payment::expected_amount(payment.delivery_cost, payment.goods_total)
                .unwrap_or_default(),
            payment_dt: now.timestamp(),
            bank: payment.bank.clone(),
            delivery_cost: payment.delivery_cost,
            goods_total: payment.goods_total,
            custom_fee: payment.custom_fee,
        },
        items: command
            .items
            .iter()
            .map(|item| build_item(item, &track_number))
            .collect(),
        locale: command.locale.clone(),
        internal_signature: String::new(),
        customer_id: command.customer_id.clone(),
        delivery_service: command.delivery_service.clone(),
        shardkey: SHARDKEY.to_owned(),
        sm_id: SM_ID,
        date_created: now,
        oof_shard: OOF_SHARD.to_owned(),
    }
}

fn build_item(item: &NewItem, track_number: &str) -> Item {
    Item {
        chrt_id: item.chrt_id,
        track_number: track_number.to_owned(),
        price: item.price,
        rid: Uuid::new_v4().to_string(),
        name: item.name.clone(),
        sale: item.sale,
        size: item.size.clone(),
        total_price: item.total_price,
        nm_id: item.nm_id,
        brand: item.brand.clone(),
        status: ITEM_STATUS_ACCEPTED,
    }
}

fn generate_track_number() -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(TRACK_SUFFIX_LEN)
        .collect();
    format!("{TRACK_PREFIX}{}", suffix.to_uppercase())
}
