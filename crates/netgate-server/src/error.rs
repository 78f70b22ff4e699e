// ── HTTP error mapping ──
//
// Every failure leaves the server as `{"detail": "..."}` with a status
// derived from the core error taxonomy.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use netgate_core::{CoreError, ErrorResponse};

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, detail)
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status = match &err {
            CoreError::Validation { .. } => StatusCode::BAD_REQUEST,
            CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::Conflict { .. } => StatusCode::CONFLICT,
            CoreError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            CoreError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            CoreError::Unsupported { .. } => StatusCode::NOT_IMPLEMENTED,
            CoreError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if !err.is_client_error() {
            error!(error = %err, "request failed");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_statuses() {
        let cases = [
            (CoreError::Validation { message: "x".into() }, 400),
            (
                CoreError::NotFound {
                    entity_type: "Rule",
                    identifier: "r1".into(),
                },
                404,
            ),
            (CoreError::Conflict { message: "x".into() }, 409),
            (CoreError::Authentication { message: "x".into() }, 401),
            (CoreError::PermissionDenied { message: "x".into() }, 403),
            (CoreError::Unsupported { operation: "x".into() }, 501),
            (CoreError::Unavailable, 503),
            (CoreError::Internal("x".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status().as_u16(), status);
        }
    }

    #[test]
    fn detail_is_display_string() {
        let err = ApiError::from(CoreError::NotFound {
            entity_type: "Rule",
            identifier: "r1".into(),
        });
        assert_eq!(err.detail(), "Rule not found: r1");
    }
}
