use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use error_common::{ErrorBody, ErrorKind, HasErrorKind};

use crate::error::GatewayError;

fn status_for(kind: ErrorKind) -> StatusCode {
    StatusCode::from_u16(kind.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = status_for(self.kind());
        let mut body = ErrorBody::from_error(&self);

        // Store and session failures are not described to clients
        if body.kind == ErrorKind::ServerError {
            body.message = "Internal server error".to_string();
        }

        (status, Json(body.to_json())).into_response()
    }
}
