//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

/// Error returned by handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    Internal(anidex_core::Error),
    Unavailable(String),
    NotFound(String),
    BadRequest(String),
}

impl From<anidex_core::Error> for ApiError {
    fn from(err: anidex_core::Error) -> Self {
        match &err {
            anidex_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            anidex_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            anidex_core::Error::QuotaExceeded(_)
            | anidex_core::Error::RetryBudgetExhausted { .. } => {
                ApiError::Unavailable(err.to_string())
            }
            _ => ApiError::Internal(err),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(err) => err.to_string(),
            ApiError::Unavailable(msg) | ApiError::NotFound(msg) | ApiError::BadRequest(msg) => {
                msg
            }
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
