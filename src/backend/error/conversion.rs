/**
 * Error Conversion
 *
 * All backend errors implement `IntoResponse` from Axum, allowing them to be
 * returned directly from handlers.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "Revision 2 is older than the oldest retained revision 8",
 *   "kind": "revision_too_old",
 *   "status": 409,
 *   "resync": true
 * }
 * ```
 */

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use crate::backend::error::types::BackendError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("[Backend] {}", self);
        } else {
            tracing::debug!("[Backend] Rejected request: {}", self);
        }

        let body = serde_json::json!({
            "error": self.message(),
            "kind": self.kind(),
            "status": status.as_u16(),
            "resync": self.needs_resync(),
        });

        (status, Json(body)).into_response()
    }
}
