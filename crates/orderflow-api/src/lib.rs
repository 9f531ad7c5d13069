//! Orderflow API — HTTP boundary and process wiring.
//!
//! Exposes the order submission and lookup endpoints. The binary in
//! `main.rs` also hosts the consumer-group worker that materializes
//! submitted orders into the store.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;

use crate::state::AppState;

/// Builds the application router without transport layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::orders::router())
        .with_state(state)
}
