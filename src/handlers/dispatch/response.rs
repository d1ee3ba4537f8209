//! Response bodies and error mapping.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::dispatch::DispatchError;

/// `{ "ok": true }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionAck {
    pub ok: bool,
}

impl ActionAck {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "dispatch request failed");
        }
        let body = ErrorBody {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
