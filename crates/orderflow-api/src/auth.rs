//! Caller identity.
//!
//! Authentication happens upstream; the gateway forwards the verified
//! customer identity in the `x-customer-id` header.

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

use crate::error::ErrorBody;

/// Header carrying the authenticated customer identity.
pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";

/// The authenticated customer making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerId(pub String);

/// Rejection for requests without a usable caller identity.
#[derive(Debug)]
pub struct Unauthorized;

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: "unauthorized",
            message: format!("missing or empty {CUSTOMER_ID_HEADER} header"),
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

impl<S> FromRequestParts<S> for CustomerId
where
    S: Send + Sync,
{
    type Rejection = Unauthorized;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CUSTOMER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Self(value.to_owned()))
            .ok_or(Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(request: Request<()>) -> Result<CustomerId, Unauthorized> {
        let (mut parts, ()) = request.into_parts();
        CustomerId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_header_value_becomes_customer_id() {
        let request = Request::builder()
            .header(CUSTOMER_ID_HEADER, " 42 ")
            .body(())
            .unwrap();

        let customer = extract(request).await.unwrap();

        assert_eq!(customer, CustomerId("42".to_owned()));
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let result = extract(Request::builder().body(()).unwrap()).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_blank_header_is_unauthorized() {
        let request = Request::builder()
            .header(CUSTOMER_ID_HEADER, "   ")
            .body(())
            .unwrap();

        let response = extract(request).await.unwrap_err().into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
