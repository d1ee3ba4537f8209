//! Caller identity extraction.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::AppState;
use crate::dispatch::DispatchError;

/// User id verified upstream. Requests without one are rejected with 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = DispatchError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(&state.user_header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|uid| !uid.is_empty())
            .map(|uid| AuthenticatedUser(uid.to_string()))
            .ok_or(DispatchError::Unauthenticated)
    }
}
