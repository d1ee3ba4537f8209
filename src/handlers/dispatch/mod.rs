//! HTTP API for delivery actions.
//!
//! Endpoints:
//! - `POST /api/delivery/action`: accept, pickup or complete a delivery
//! - `GET /api/health`: liveness
//!
//! The caller's identity arrives in a header set by the upstream auth layer;
//! everything else about the caller is looked up per request.

mod auth;
mod request;
mod response;

pub use auth::AuthenticatedUser;
pub use request::DispatchRequest;
pub use response::ActionAck;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderName, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::dispatch::errmsg;
use crate::dispatch::{DispatchError, DispatchService};

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DispatchService>,
    /// Header holding the authenticated user id.
    pub user_header: HeaderName,
}

impl AppState {
    pub fn new(service: Arc<DispatchService>, user_header: HeaderName) -> Self {
        Self {
            service,
            user_header,
        }
    }
}

/// Start the HTTP server on `addr`.
///
/// The actual bound address is logged, so port 0 can be used.
pub async fn serve(
    state: AppState,
    addr: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "dispatch API listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the axum router (separated for testing).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/delivery/action", post(delivery_action))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn delivery_action(
    State(state): State<AppState>,
    AuthenticatedUser(uid): AuthenticatedUser,
    body: Result<Json<DispatchRequest>, JsonRejection>,
) -> Result<Json<ActionAck>, DispatchError> {
    let Json(body) = body.map_err(|e| {
        warn!(uid = %uid, error = %e, "malformed dispatch request");
        DispatchError::BadRequest(errmsg::INVALID_BODY)
    })?;

    let request = body.into_transition(state.service.policy())?;
    state.service.handle(&uid, request).await?;
    Ok(Json(ActionAck::ok()))
}
