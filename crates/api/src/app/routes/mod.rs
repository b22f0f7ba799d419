use axum::Router;

pub mod accounts;
pub mod payments;
pub mod system;

/// Router for the versioned account and payment endpoints.
pub fn router() -> Router {
    Router::new()
        .merge(accounts::router())
        .merge(payments::router())
}
