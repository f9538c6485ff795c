use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use interio_contracts::responses::ErrorResponse;
use interio_engine::{error_chain_text, RouteError};

const DETAILS_MAX_CHARS: usize = 512;

/// Failure surfaced to API clients as `{error, details?}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{message}")]
    Internal {
        message: String,
        details: Option<String>,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::BadRequest(message) | ApiError::PayloadTooLarge(message) => ErrorResponse {
                error: message.clone(),
                details: None,
            },
            ApiError::Internal { message, details } => ErrorResponse {
                error: message.clone(),
                details: details.clone(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge(rejection.body_text());
        }
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<RouteError> for ApiError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::Validation(message) => ApiError::BadRequest(message),
            RouteError::Unavailable(_) => ApiError::Internal {
                message: err.to_string(),
                details: None,
            },
            RouteError::Provider(source) => ApiError::Internal {
                message: source.to_string(),
                details: error_chain_text(&source, DETAILS_MAX_CHARS),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::info!(error = %self, "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}
