//! Request extractors for caller identity and validated JSON bodies.
//!
//! Authentication happens upstream: the gateway in front of this service
//! verifies the session and forwards the caller as `x-user-id` (a UUID) and
//! `x-user-role`.

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use common::UserId;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const ADMIN_ROLE: &str = "admin";

/// Caller identity, required on every customer route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(USER_ID_HEADER) else {
            metrics::counter!("auth_rejections_total", "reason" => "missing").increment(1);
            return Err(ApiError::Unauthorized("Authentication required".to_string()));
        };

        let user_id = raw
            .to_str()
            .ok()
            .and_then(|value| uuid::Uuid::parse_str(value.trim()).ok())
            .map(UserId::from_uuid)
            .ok_or_else(|| {
                metrics::counter!("auth_rejections_total", "reason" => "malformed").increment(1);
                ApiError::Unauthorized("Invalid user identity".to_string())
            })?;

        let is_admin = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|role| role.to_str().ok())
            .is_some_and(|role| role.trim().eq_ignore_ascii_case(ADMIN_ROLE));

        Ok(Self { user_id, is_admin })
    }
}

/// Caller holding the admin role. Rejects everyone else with 403.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub CurrentUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            metrics::counter!("auth_rejections_total", "reason" => "forbidden").increment(1);
            tracing::warn!(user_id = %user.user_id, path = %parts.uri.path(), "admin route denied");
            return Err(ApiError::Forbidden);
        }
        Ok(Self(user))
    }
}

/// JSON body whose rejections map to `400 INVALID_REQUEST`.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}
