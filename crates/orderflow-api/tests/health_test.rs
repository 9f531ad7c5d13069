//! Integration tests for the health endpoint.

mod common;

use axum::http::StatusCode;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
async fn test_health_returns_200_with_status_ok(pool: PgPool) {
    let harness = common::TestHarness::new(pool);

    let (status, json) = common::get_json(harness.app(), "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_unknown_route_returns_404(pool: PgPool) {
    let harness = common::TestHarness::new(pool);

    let (status, _) = common::get_json(harness.app(), "/api/v1/nonexistent", Some("42")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
