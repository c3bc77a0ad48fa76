//! External payment capture endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use checkout::CaptureRequest;
use serde::Deserialize;
use store::StorefrontStore;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{CurrentUser, ValidJson};
use crate::routes::orders::{CustomerRequest, OrderItemRequest, OrderResponse};

#[derive(Debug, Deserialize)]
pub struct CaptureBody {
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub customer: CustomerRequest,
}

/// POST /payments/{external_id}/capture: Capture a provider order and
/// record it locally.
///
/// Replays for an already-recorded provider order return the stored order.
#[tracing::instrument(skip(state, body), fields(user_id = %user.user_id))]
pub async fn capture<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
    Path(external_id): Path<String>,
    ValidJson(body): ValidJson<CaptureBody>,
) -> Result<Json<OrderResponse>, ApiError> {
    let request = CaptureRequest {
        user_id: Some(user.user_id),
        lines: body.items.iter().map(OrderItemRequest::to_line).collect(),
        customer: body.customer.into(),
    };

    let order = state
        .workflow
        .capture_external_payment(&external_id, request)
        .await?;

    Ok(Json(OrderResponse::from(&order)))
}
