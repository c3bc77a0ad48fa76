//! API error types with HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use serde_json::{Map, Value, json};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Error raised by a checkout service.
    Checkout(CheckoutError),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or malformed user identity.
    Unauthorized(String),
    /// Authenticated caller lacking the admin role.
    Forbidden,
    /// Resource not found.
    NotFound(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Checkout(err) => checkout_status(err),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

fn checkout_status(err: &CheckoutError) -> StatusCode {
    match err {
        CheckoutError::InvalidRequest(_)
        | CheckoutError::InvalidCustomerInfo { .. }
        | CheckoutError::PaymentNotCompleted { .. } => StatusCode::BAD_REQUEST,
        CheckoutError::ProductNotFound(_)
        | CheckoutError::OrderNotFound(_)
        | CheckoutError::CartLineNotFound(_) => StatusCode::NOT_FOUND,
        CheckoutError::InsufficientStock { .. } | CheckoutError::InvalidTransition { .. } => {
            StatusCode::CONFLICT
        }
        CheckoutError::PaymentProvider(_) => StatusCode::BAD_GATEWAY,
        CheckoutError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Business details attached next to `error` and `code`.
fn checkout_details(err: &CheckoutError) -> Map<String, Value> {
    let details = match err {
        CheckoutError::ProductNotFound(product_id)
        | CheckoutError::CartLineNotFound(product_id) => json!({ "product_id": product_id }),
        CheckoutError::InsufficientStock {
            product_id,
            available,
            requested,
        } => json!({
            "product_id": product_id,
            "available": available,
            "requested": requested,
        }),
        CheckoutError::InvalidCustomerInfo { field } => json!({ "field": field }),
        CheckoutError::PaymentNotCompleted { status } => json!({ "status": status }),
        CheckoutError::OrderNotFound(order_id) => json!({ "order_id": order_id }),
        CheckoutError::InvalidTransition { from, to } => json!({
            "from": from.as_str(),
            "to": to.as_str(),
        }),
        _ => Value::Null,
    };

    match details {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, code, details) = match self {
            ApiError::Checkout(err @ CheckoutError::Persistence(_)) => {
                tracing::error!(error = %err, "storage failure");
                (
                    "Service temporarily unavailable, please retry".to_string(),
                    err.code(),
                    Map::new(),
                )
            }
            ApiError::Checkout(err @ CheckoutError::PaymentProvider(_)) => {
                tracing::warn!(error = %err, "payment provider failure");
                (err.to_string(), err.code(), Map::new())
            }
            ApiError::Checkout(err) => (err.to_string(), err.code(), checkout_details(&err)),
            ApiError::BadRequest(msg) => (msg, "INVALID_REQUEST", Map::new()),
            ApiError::Unauthorized(msg) => (msg, "UNAUTHORIZED", Map::new()),
            ApiError::Forbidden => (
                "Administrator role required".to_string(),
                "FORBIDDEN",
                Map::new(),
            ),
            ApiError::NotFound(msg) => (msg, "NOT_FOUND", Map::new()),
        };

        let mut body = Map::new();
        body.insert("error".to_string(), Value::String(message));
        body.insert("code".to_string(), Value::String(code.to_string()));
        body.extend(details);

        (status, Json(Value::Object(body))).into_response()
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

#[cfg(test)]
mod tests {
    use common::ProductId;
    use domain::FulfillmentState;
    use store::StoreError;

    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_insufficient_stock_carries_details() {
        let (status, body) = body_of(ApiError::Checkout(CheckoutError::InsufficientStock {
            product_id: ProductId::new("P1"),
            available: 2,
            requested: 3,
        }))
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");
        assert_eq!(body["product_id"], "P1");
        assert_eq!(body["available"], 2);
        assert_eq!(body["requested"], 3);
    }

    #[tokio::test]
    async fn test_persistence_error_is_generic() {
        let (status, body) = body_of(ApiError::Checkout(CheckoutError::Persistence(
            StoreError::Unavailable("connection refused to 10.0.0.7".to_string()),
        )))
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "PERSISTENCE_ERROR");
        assert!(!body["error"].as_str().unwrap().contains("10.0.0.7"));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (
                ApiError::Checkout(CheckoutError::InvalidCustomerInfo { field: "city" }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Checkout(CheckoutError::InvalidTransition {
                    from: FulfillmentState::Delivered,
                    to: FulfillmentState::Shipped,
                }),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Checkout(CheckoutError::CartLineNotFound(ProductId::new("A"))),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Checkout(CheckoutError::PaymentProvider("down".to_string())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::Unauthorized("missing".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (ApiError::Forbidden, StatusCode::FORBIDDEN),
        ];

        for (err, expected) in cases {
            assert_eq!(body_of(err).await.0, expected);
        }
    }
}
