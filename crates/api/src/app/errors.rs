use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use coins_core::{AccountId, DomainError};
use coins_infra::StoreError;
use coins_payments::{ErrorKind, PaymentError};

pub fn payment_error_to_response(err: PaymentError) -> axum::response::Response {
    let (status, code) = match err.kind() {
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        ErrorKind::InsufficientFunds => (StatusCode::BAD_REQUEST, "insufficient_funds"),
        ErrorKind::Validation => (StatusCode::BAD_REQUEST, "validation_error"),
        ErrorKind::LockUnavailable => (StatusCode::CONFLICT, "lock_unavailable"),
        ErrorKind::Infrastructure => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    json_error(status, code, err.to_string())
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    tracing::error!(error = %err, "store failure");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", err.to_string())
}

/// Malformed, mistyped or missing JSON bodies.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_account_id(s: &str) -> Result<AccountId, axum::response::Response> {
    s.parse::<AccountId>().map_err(domain_error_to_response)
}
