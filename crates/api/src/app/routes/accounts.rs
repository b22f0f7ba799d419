use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use coins_accounts::NewAccount;
use coins_infra::accounts::AccountStore;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/account/v1", get(list_accounts).post(create_account))
        .route("/account/v1/", get(list_accounts).post(create_account))
        .route("/account/v1/:id", get(get_account))
}

pub async fn create_account(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateAccountRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let account = match NewAccount::new(body.first_name, body.last_name) {
        Ok(a) => a,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.accounts.store(account).await {
        Ok(account) => {
            tracing::info!(account_id = %account.id, "account created");
            (StatusCode::CREATED, Json(json!({ "account": account }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_accounts(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.accounts.list().await {
        Ok(accounts) => (StatusCode::OK, Json(json!({ "accounts": accounts }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_account(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_account_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.accounts.get(id).await {
        Ok(Some(account)) => (StatusCode::OK, Json(json!({ "account": account }))).into_response(),
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("account with ID {id} not found"),
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}
