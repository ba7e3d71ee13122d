use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::cart::CartError;

/// Logs every request once. Handlers attach a `Result<(), ApiError>` via
/// [`to_response`]; rejected client input is a warning, server faults are errors.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed = start.elapsed();
    match response.extensions().get::<Result<(), ApiError>>() {
        Some(Err(value)) if status.is_server_error() => error!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            value = %value,
            "Failed to process request"
        ),
        Some(Err(value)) => warn!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            value = %value,
            "Rejected request"
        ),
        // middleware rejections (401) never reach a handler
        None if !status.is_success() => warn!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            "Rejected request"
        ),
        _ => info!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            "Processed request"
        ),
    }

    response
}

#[derive(Clone, Debug, Error)]
pub enum ApiError {
    #[error("Failed to create transaction")]
    TransactionCreationFailed,
    #[error("Failed to hash password {0}")]
    PasswordHashFailed(String),
    #[error("{0}")]
    General(String),
    #[error("Failed to generate token: {0}")]
    TokenGenerationFailed(String),
    #[error("Database error: {0}")]
    DbError(String),
    #[error("Failed to validate: {0}")]
    ValidationFail(String),
    #[error("Cart error: {0}")]
    Cart(String),
}

impl From<&CartError> for ApiError {
    fn from(err: &CartError) -> Self {
        match err {
            CartError::Database(db_err) => ApiError::DbError(db_err.to_string()),
            other => ApiError::Cart(other.to_string()),
        }
    }
}

/// Attaches the handler outcome for [`logging_middleware`].
pub fn to_response<T: IntoResponse>(response: T, outcome: Result<(), ApiError>) -> Response {
    let mut response = response.into_response();

    response.extensions_mut().insert(outcome);

    response
}
