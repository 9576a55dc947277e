use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Client sent a missing or malformed URL.
    #[error("{0}")]
    Validation(String),

    #[error("short link '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("no free token after {0} attempt(s)")]
    TokenExhausted(u32),

    /// A stored URL that cannot be turned into a `Location` header.
    #[error("stored URL for '{0}' is not a valid redirect target")]
    InvalidTarget(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::NotFound(_) => {
                (StatusCode::NOT_FOUND, "Short link not found").into_response()
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
            AppError::TokenExhausted(attempts) => {
                tracing::error!("Gave up generating a free token after {} attempt(s)", attempts);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
            AppError::InvalidTarget(token) => {
                tracing::error!("Stored URL for '{}' cannot be redirected to", token);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}
