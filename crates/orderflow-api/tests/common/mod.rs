//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use orderflow_api::auth::CUSTOMER_ID_HEADER;
use orderflow_api::state::AppState;
use orderflow_core::clock::Clock;
use orderflow_queue::{IncomingMessage, OrderIngestor, Outcome};
use orderflow_store::PgOrderRepository;
use orderflow_test_support::{FixedClock, InMemoryOrderCache, RecordingPublisher, fixed_now};
use sqlx::PgPool;
use tower::ServiceExt;

/// Topic the test app publishes orders to.
pub const ORDERS_TOPIC: &str = "orders";
/// Topic the test ingestor parks failed orders on.
pub const DEAD_LETTER_TOPIC: &str = "orders.dlq";

/// The HTTP app wired to a real `PgOrderRepository`, with the broker
/// replaced by a `RecordingPublisher` that `drain_queue` replays into the
/// worker's ingestor.
pub struct TestHarness {
    pub publisher: Arc<RecordingPublisher>,
    pub cache: Arc<InMemoryOrderCache>,
    state: AppState,
    ingestor: OrderIngestor,
}

impl TestHarness {
    pub fn new(pool: PgPool) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(fixed_now()));
        let publisher = Arc::new(RecordingPublisher::new());
        let cache = Arc::new(InMemoryOrderCache::new(clock.clone()));
        let repository = Arc::new(PgOrderRepository::new(pool));

        let state = AppState::new(
            clock.clone(),
            publisher.clone(),
            ORDERS_TOPIC,
            repository.clone(),
            cache.clone(),
        );
        let ingestor = OrderIngestor::new(repository, publisher.clone(), DEAD_LETTER_TOPIC, clock);

        Self {
            publisher,
            cache,
            state,
            ingestor,
        }
    }

    /// Build the full app router. Uses the same route structure as `main.rs`.
    pub fn app(&self) -> Router {
        orderflow_api::app(self.state.clone())
    }

    /// Delivers every message published to the orders topic so far to the
    /// ingestor, in publish order, and returns what happened to each.
    pub async fn drain_queue(&self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        for (offset, message) in self.publisher.published_to(ORDERS_TOPIC).iter().enumerate() {
            let incoming = IncomingMessage {
                topic: ORDERS_TOPIC,
                partition: 0,
                offset: i64::try_from(offset).unwrap(),
                payload: Some(&message.payload),
            };
            outcomes.push(self.ingestor.ingest(&incoming).await.unwrap());
        }
        outcomes
    }
}

/// Send a POST request with a JSON body as `customer` and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    customer: Option<&str>,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(customer) = customer {
        builder = builder.header(CUSTOMER_ID_HEADER, customer);
    }
    let request = builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request as `customer` and return the response.
pub async fn get_json(
    app: Router,
    uri: &str,
    customer: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(customer) = customer {
        builder = builder.header(CUSTOMER_ID_HEADER, customer);
    }
    let request = builder.body(Body::empty()).unwrap();

    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// A valid order submission body.
pub fn order_body() -> serde_json::Value {
    serde_json::json!({
        "delivery": {
            "name": "Test Testov",
            "phone": "+9720000000",
            "zip": "2639809",
            "city": "Kiryat Mozkin",
            "address": "Ploshad Mira 15",
            "region": "Kraiot",
            "email": "test@gmail.com"
        },
        "payment": {
            "currency": "USD",
            "provider": "wbpay",
            "bank": "alpha",
            "delivery_cost": 1500,
            "goods_total": 317,
            "custom_fee": 0
        },
        "items": [
            {
                "chrt_id": 9_934_930,
                "name": "Mascaras",
                "price": 453,
                "sale": 30,
                "size": "0",
                "brand": "Vivienne Sabo",
                "total_price": 317,
                "nm_id": 2_389_212
            },
            {
                "chrt_id": 1,
                "name": "Gift wrap",
                "price": 0,
                "sale": 0,
                "size": "0",
                "brand": "House",
                "total_price": 0,
                "nm_id": 1
            }
        ],
        "locale": "en",
        "delivery_service": "meest"
    })
}
