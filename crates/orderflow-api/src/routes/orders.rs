//! Routes for order submission and lookup.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use orderflow_core::order::Order;
use orderflow_orders::application::{command_handlers, query_handlers};
use orderflow_orders::domain::commands::{self, NewDelivery, NewItem, NewPayment};

use crate::auth::CustomerId;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /orders.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Recipient and address.
    pub delivery: NewDelivery,
    /// Payment details.
    pub payment: NewPayment,
    /// Line items, in order.
    pub items: Vec<NewItem>,
    /// Customer locale.
    pub locale: String,
    /// Requested delivery service.
    pub delivery_service: String,
}

/// Response body returned once the order is queued.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    /// Human-readable confirmation.
    pub message: &'static str,
    /// Identifier to look the order up with.
    pub order_uid: String,
    /// Generated tracking number.
    pub track_number: String,
}

/// POST /orders
#[instrument(skip(state, request), fields(customer_id = %customer.0))]
async fn create_order(
    State(state): State<AppState>,
    customer: CustomerId,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    let command = commands::SubmitOrder {
        correlation_id: Uuid::new_v4(),
        customer_id: customer.0,
        delivery: request.delivery,
        payment: request.payment,
        items: request.items,
        locale: request.locale,
        delivery_service: request.delivery_service,
    };

    info!(correlation_id = %command.correlation_id, "handling submit_order command");

    let submitted = command_handlers::handle_submit_order(
        &command,
        state.clock.as_ref(),
        &*state.publisher,
        &state.orders_topic,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            message: "order accepted for processing",
            order_uid: submitted.order_uid,
            track_number: submitted.track_number,
        }),
    ))
}

/// GET /orders/{order_uid}
#[instrument(skip(state), fields(customer_id = %customer.0))]
async fn get_order(
    State(state): State<AppState>,
    customer: CustomerId,
    Path(order_uid): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order = query_handlers::get_order_by_id(
        &order_uid,
        &customer.0,
        &*state.order_cache,
        &*state.order_repository,
    )
    .await?;

    Ok(Json(order))
}

/// Returns the router for the order endpoints.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/{order_uid}", get(get_order))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use orderflow_core::cache::OrderCache;
    use orderflow_core::publisher::OrderPublisher;
    use orderflow_core::repository::OrderRepository;
    use orderflow_test_support::{
        FailingOrderCache, FailingOrderRepository, FailingPublisher, FixedClock,
        InMemoryOrderCache, InMemoryOrderRepository, RecordingPublisher, fixed_now, sample_order,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::auth::CUSTOMER_ID_HEADER;

    fn app_state_with(
        publisher: Arc<dyn OrderPublisher>,
        repository: Arc<dyn OrderRepository>,
        cache: Arc<dyn OrderCache>,
    ) -> AppState {
        AppState::new(
            Arc::new(FixedClock(fixed_now())),
            publisher,
            "orders",
            repository,
            cache,
        )
    }

    fn test_app_state(publisher: Arc<dyn OrderPublisher>) -> AppState {
        app_state_with(
            publisher,
            Arc::new(InMemoryOrderRepository::new()),
            Arc::new(InMemoryOrderCache::new(Arc::new(FixedClock(fixed_now())))),
        )
    }

    fn order_body() -> Value {
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
            "items": [{
                "chrt_id": 9_934_930,
                "name": "Mascaras",
                "price": 453,
                "sale": 30,
                "size": "0",
                "brand": "Vivienne Sabo",
                "total_price": 317,
                "nm_id": 2_389_212
            }],
            "locale": "en",
            "delivery_service": "meest"
        })
    }

    fn post_order(body: &Value, customer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/orders")
            .header("content-type", "application/json");
        if let Some(customer) = customer {
            builder = builder.header(CUSTOMER_ID_HEADER, customer);
        }
        builder
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    fn get_order_request(order_uid: &str, customer: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(format!("/orders/{order_uid}"))
            .header(CUSTOMER_ID_HEADER, customer)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_of(response: axum::response::Response) -> Value {
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_order_returns_201_and_publishes() {
        // Arrange
        let publisher = Arc::new(RecordingPublisher::new());
        let app = router().with_state(test_app_state(publisher.clone()));

        // Act
        let response = app
            .oneshot(post_order(&order_body(), Some("42")))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = json_of(response).await;
        let order_uid = json["order_uid"].as_str().unwrap();
        Uuid::parse_str(order_uid).unwrap();
        assert!(json["track_number"].as_str().unwrap().starts_with("WB"));

        let published = publisher.published_to("orders");
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].key.as_deref(), Some(order_uid));
    }

    #[tokio::test]
    async fn test_create_order_without_customer_returns_401() {
        let publisher = Arc::new(RecordingPublisher::new());
        let app = router().with_state(test_app_state(publisher.clone()));

        let response = app.oneshot(post_order(&order_body(), None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_of(response).await["error"], "unauthorized");
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_create_order_with_invalid_sale_returns_400() {
        let app = router().with_state(test_app_state(Arc::new(RecordingPublisher::new())));
        let mut body = order_body();
        body["items"][0]["sale"] = serde_json::json!(150);

        let response = app.oneshot(post_order(&body, Some("42"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_of(response).await["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_create_order_when_broker_is_down_returns_503() {
        let app = router().with_state(test_app_state(Arc::new(FailingPublisher)));

        let response = app
            .oneshot(post_order(&order_body(), Some("42")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_get_order_returns_owned_order() {
        // Arrange
        let order = sample_order("u1", "42");
        let state = app_state_with(
            Arc::new(RecordingPublisher::new()),
            Arc::new(InMemoryOrderRepository::with_orders(vec![order.clone()])),
            Arc::new(FailingOrderCache),
        );
        let app = router().with_state(state);

        // Act
        let response = app.oneshot(get_order_request("u1", "42")).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_of(response).await;
        let loaded: Order = serde_json::from_value(json).unwrap();
        assert_eq!(loaded, order);
    }

    #[tokio::test]
    async fn test_get_order_of_another_customer_returns_404() {
        let state = app_state_with(
            Arc::new(RecordingPublisher::new()),
            Arc::new(InMemoryOrderRepository::with_orders(vec![sample_order("u1", "42")])),
            Arc::new(InMemoryOrderCache::new(Arc::new(FixedClock(fixed_now())))),
        );
        let app = router().with_state(state);

        let response = app.oneshot(get_order_request("u1", "7")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_of(response).await["error"], "order_not_found");
    }

    #[tokio::test]
    async fn test_get_order_when_store_is_down_returns_500() {
        let state = app_state_with(
            Arc::new(RecordingPublisher::new()),
            Arc::new(FailingOrderRepository::Unavailable),
            Arc::new(InMemoryOrderCache::new(Arc::new(FixedClock(fixed_now())))),
        );
        let app = router().with_state(state);

        let response = app.oneshot(get_order_request("u1", "42")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
