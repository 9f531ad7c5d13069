//! `PostgreSQL` implementation of the `OrderRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use orderflow_core::error::PersistError;
use orderflow_core::order::{Delivery, Item, Order, Payment};
use orderflow_core::repository::OrderRepository;

const INSERT_DELIVERY: &str = r"
INSERT INTO deliveries (name, phone, zip, city, address, region, email)
VALUES ($1, $2, $3, $4, $5, $6, $7)
RETURNING id
";

const INSERT_PAYMENT: &str = r"
INSERT INTO payments (transaction, request_id, currency, provider, amount, payment_dt,
                      bank, delivery_cost, goods_total, custom_fee)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
RETURNING id
";

const INSERT_ORDER: &str = r"
INSERT INTO orders (order_uid, track_number, entry, delivery_data_id, payment_data_id, locale,
                    internal_signature, customer_id, delivery_service, shardkey, sm_id,
                    date_created, oof_shard)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
RETURNING id
";

const INSERT_ITEM: &str = r"
INSERT INTO items (order_id, chrt_id, track_number, price, rid, name, sale, size,
                   total_price, nm_id, brand, status)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
";

const SELECT_ORDER: &str = r"
SELECT o.id, o.order_uid, o.track_number, o.entry, o.locale, o.internal_signature,
       o.customer_id, o.delivery_service, o.shardkey, o.sm_id, o.date_created, o.oof_shard,
       d.name AS delivery_name, d.phone AS delivery_phone, d.zip AS delivery_zip,
       d.city AS delivery_city, d.address AS delivery_address, d.region AS delivery_region,
       d.email AS delivery_email,
       p.transaction, p.request_id, p.currency, p.provider, p.amount, p.payment_dt,
       p.bank, p.delivery_cost, p.goods_total, p.custom_fee
FROM orders o
JOIN deliveries d ON o.delivery_data_id = d.id
JOIN payments p ON o.payment_data_id = p.id
WHERE o.order_uid = $1 AND o.customer_id = $2
";

const SELECT_ITEMS: &str = r"
SELECT chrt_id, track_number, price, rid, name, sale, size, total_price, nm_id, brand, status
FROM items
WHERE order_id = $1
ORDER BY id
";

/// PostgreSQL-backed order repository.
#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Creates a new `PgOrderRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_order(
        tx: &mut Transaction<'_, Postgres>,
        order: &Order,
    ) -> Result<i64, sqlx::Error> {
        let delivery = &order.delivery;
        let delivery_id: i64 = sqlx::query_scalar(INSERT_DELIVERY)
            .bind(&delivery.name)
            .bind(&delivery.phone)
            .bind(&delivery.zip)
            .bind(&delivery.city)
            .bind(&delivery.address)
            .bind(&delivery.region)
            .bind(&delivery.email)
            .fetch_one(&mut **tx)
            .await?;

        let payment = &order.payment;
        let payment_id: i64 = sqlx::query_scalar(INSERT_PAYMENT)
            .bind(&payment.transaction)
            .bind(&payment.request_id)
            .bind(&payment.currency)
            .bind(&payment.provider)
            .bind(payment.amount)
            .bind(payment.payment_dt)
            .bind(&payment.bank)
            .bind(payment.delivery_cost)
            .bind(payment.goods_total)
            .bind(payment.custom_fee)
            .fetch_one(&mut **tx)
            .await?;

        let order_id: i64 = sqlx::query_scalar(INSERT_ORDER)
            .bind(&order.order_uid)
            .bind(&order.track_number)
            .bind(&order.entry)
            .bind(delivery_id)
            .bind(payment_id)
            .bind(&order.locale)
            .bind(&order.internal_signature)
            .bind(&order.customer_id)
            .bind(&order.delivery_service)
            .bind(&order.shardkey)
            .bind(order.sm_id)
            .bind(order.date_created)
            .bind(&order.oof_shard)
            .fetch_one(&mut **tx)
            .await?;

        for item in &order.items {
            sqlx::query(INSERT_ITEM)
                .bind(order_id)
                .bind(item.chrt_id)
                .bind(&item.track_number)
                .bind(item.price)
                .bind(&item.rid)
                .bind(&item.name)
                .bind(item.sale)
                .bind(&item.size)
                .bind(item.total_price)
                .bind(item.nm_id)
                .bind(&item.brand)
                .bind(item.status)
                .execute(&mut **tx)
                .await?;
        }

        Ok(order_id)
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    #[instrument(skip(self, order), fields(order_uid = %order.order_uid))]
    async fn create(&self, order: &Order) -> Result<(), PersistError> {
        // TIMESTAMPTZ would round sub-microsecond digits.
        if order.date_created.timestamp_subsec_nanos() % 1_000 != 0 {
            return Err(PersistError::Rejected(format!(
                "order {}: date_created is more precise than microseconds",
                order.order_uid
            )));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| classify(e, &order.order_uid))?;

        // Dropping `tx` on the error path rolls the whole order back.
        let order_id = Self::insert_order(&mut tx, order)
            .await
            .map_err(|e| classify(e, &order.order_uid))?;

        tx.commit()
            .await
            .map_err(|e| classify(e, &order.order_uid))?;

        debug!(order_id, items = order.items.len(), "order rows committed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_by_id(
        &self,
        order_uid: &str,
        customer_id: &str,
    ) -> Result<Option<Order>, PersistError> {
        let mut tx = self.pool.begin().await.map_err(|e| classify(e, order_uid))?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| classify(e, order_uid))?;

        let row: Option<OrderRow> = sqlx::query_as(SELECT_ORDER)
            .bind(order_uid)
            .bind(customer_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| classify(e, order_uid))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items: Vec<ItemRow> = sqlx::query_as(SELECT_ITEMS)
            .bind(row.id)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| classify(e, order_uid))?;

        tx.commit().await.map_err(|e| classify(e, order_uid))?;

        Ok(Some(row.into_order(items)))
    }
}

/// Maps a sqlx error onto the persistence taxonomy.
///
/// Connection-level failures and serialization conflicts are transient;
/// constraint violations and decode failures are permanent.
fn classify(err: sqlx::Error, order_uid: &str) -> PersistError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PersistError::Duplicate(order_uid.to_owned())
        }
        sqlx::Error::Database(db) => {
            // SQLSTATE classes 08 (connection), 40 (transaction rollback),
            // 53 (insufficient resources) and 57 (operator intervention).
            let transient = db
                .code()
                .is_some_and(|code| ["08", "40", "53", "57"].iter().any(|c| code.starts_with(c)));
            if transient {
                PersistError::Unavailable(err.to_string())
            } else {
                PersistError::Rejected(err.to_string())
            }
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => PersistError::Unavailable(err.to_string()),
        _ => PersistError::Rejected(err.to_string()),
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    order_uid: String,
    track_number: String,
    entry: String,
    locale: String,
    internal_signature: String,
    customer_id: String,
    delivery_service: String,
    shardkey: String,
    sm_id: i64,
    date_created: DateTime<Utc>,
    oof_shard: String,
    delivery_name: String,
    delivery_phone: String,
    delivery_zip: String,
    delivery_city: String,
    delivery_address: String,
    delivery_region: String,
    delivery_email: String,
    transaction: String,
    request_id: String,
    currency: String,
    provider: String,
    amount: i64,
    payment_dt: i64,
    bank: String,
    delivery_cost: i64,
    goods_total: i64,
    custom_fee: i64,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    chrt_id: i64,
    track_number: String,
    price: i64,
    rid: String,
    name: String,
    sale: i32,
    size: String,
    total_price: i64,
    nm_id: i64,
    brand: String,
    status: i32,
}

impl OrderRow {
    fn into_order(self, items: Vec<ItemRow>) -> Order {
        Order {
            order_uid: self.order_uid,
            track_number: self.track_number,
            entry: self.entry,
            delivery: Delivery {
                name: self.delivery_name,
                phone: self.delivery_phone,
                zip: self.delivery_zip,
                city: self.delivery_city,
                address: self.delivery_address,
                region: self.delivery_region,
                email: self.delivery_email,
            },
            payment: Payment {
                transaction: self.transaction,
                request_id: self.request_id,
                currency: self.currency,
                provider: self.provider,
                amount: self.amount,
                payment_dt: self.payment_dt,
                bank: self.bank,
                delivery_cost: self.delivery_cost,
                goods_total: self.goods_total,
                custom_fee: self.custom_fee,
            },
            items: items.into_iter().map(ItemRow::into_item).collect(),
            locale: self.locale,
            internal_signature: self.internal_signature,
            customer_id: self.customer_id,
            delivery_service: self.delivery_service,
            shardkey: self.shardkey,
            sm_id: self.sm_id,
            date_created: self.date_created,
            oof_shard: self.oof_shard,
        }
    }
}

impl ItemRow {
    fn into_item(self) -> Item {
        Item {
            chrt_id: self.chrt_id,
            track_number: self.track_number,
            price: self.price,
            rid: self.rid,
            name: self.name,
            sale: self.sale,
            size: self.size,
            total_price: self.total_price,
            nm_id: self.nm_id,
            brand: self.brand,
            status: self.status,
        }
    }
}
