use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/payment/v1/balance/:id", get(get_balance))
        .route("/payment/v1/transactions/:id", get(list_transactions))
        .route("/payment/v1/transfer", post(transfer))
        .route("/payment/v1/topup", post(top_up))
}

pub async fn get_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_account_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.ledger.get_balance(id).await {
        Ok(balance) => (StatusCode::OK, Json(json!({ "balance": balance }))).into_response(),
        Err(e) => errors::payment_error_to_response(e),
    }
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_account_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.ledger.list_transactions(id).await {
        Ok(transactions) => {
            (StatusCode::OK, Json(json!({ "transactions": transactions }))).into_response()
        }
        Err(e) => errors::payment_error_to_response(e),
    }
}

pub async fn transfer(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::TransferRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.ledger.transfer(body.from, body.to, body.amount).await {
        Ok(transaction) => {
            (StatusCode::OK, Json(json!({ "transaction": transaction }))).into_response()
        }
        Err(e) => errors::payment_error_to_response(e),
    }
}

pub async fn top_up(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::TopUpRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.ledger.top_up(body.account_id, body.amount).await {
        Ok(balance) => (StatusCode::OK, Json(json!({ "balance": balance }))).into_response(),
        Err(e) => errors::payment_error_to_response(e),
    }
}
