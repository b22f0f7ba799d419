use std::sync::Arc;

use coins_api::app::services::AppServices;
use coins_core::AccountId;
use coins_infra::accounts::InMemoryAccountStore;
use coins_infra::ledger::{InMemoryLedgerStore, LedgerStore, UnitOfWork};
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::with_services(AppServices::in_memory()).await
    }

    async fn with_services(services: AppServices) -> Self {
        // Same router as prod, ephemeral port.
        let app = coins_api::app::build_app(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create_account(
    client: &reqwest::Client,
    srv: &TestServer,
    first: &str,
    last: &str,
) -> i64 {
    let res = client
        .post(srv.url("/account/v1/"))
        .json(&json!({ "first_name": first, "last_name": last }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    body["account"]["id"].as_i64().unwrap()
}

async fn top_up(
    client: &reqwest::Client,
    srv: &TestServer,
    account_id: i64,
    amount: f64,
) -> reqwest::Response {
    client
        .post(srv.url("/payment/v1/topup"))
        .json(&json!({ "account_id": account_id, "amount": amount }))
        .send()
        .await
        .unwrap()
}

async fn transfer(
    client: &reqwest::Client,
    srv: &TestServer,
    from: i64,
    to: i64,
    amount: f64,
) -> reqwest::Response {
    client
        .post(srv.url("/payment/v1/transfer"))
        .json(&json!({ "from": from, "to": to, "amount": amount }))
        .send()
        .await
        .unwrap()
}

async fn balance_of(client: &reqwest::Client, srv: &TestServer, account_id: i64) -> f64 {
    let res = client
        .get(srv.url(&format!("/payment/v1/balance/{account_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["balance"]["account_id"].as_i64().unwrap(), account_id);
    body["balance"]["balance"].as_f64().unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn accounts_can_be_created_listed_and_fetched() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let ada = create_account(&client, &srv, "Ada", "Lovelace").await;
    let alan = create_account(&client, &srv, " Alan ", "Turing").await;
    assert_eq!((ada, alan), (1, 2));

    let res = client.get(srv.url("/account/v1/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let accounts = body["accounts"].as_array().unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[1]["first_name"], "Alan");

    let res = client.get(srv.url("/account/v1/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["account"]["last_name"], "Lovelace");

    let res = client.get(srv.url("/account/v1/99")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.get(srv.url("/account/v1/abc")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn blank_names_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/account/v1/"))
        .json(&json!({ "first_name": "  ", "last_name": "Hopper" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn top_up_then_transfer_updates_balances_and_history() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let a = create_account(&client, &srv, "Ada", "Lovelace").await;
    let b = create_account(&client, &srv, "Alan", "Turing").await;

    assert_eq!(balance_of(&client, &srv, a).await, 0.0);

    let res = top_up(&client, &srv, a, 100.0).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["balance"]["balance"].as_f64().unwrap(), 100.0);

    let res = transfer(&client, &srv, a, b, 40.0).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let tx = &body["transaction"];
    assert_eq!(tx["from"].as_i64().unwrap(), a);
    assert_eq!(tx["to"].as_i64().unwrap(), b);
    assert_eq!(tx["amount"].as_f64().unwrap(), 40.0);
    assert!(tx["date"].is_string());

    assert_eq!(balance_of(&client, &srv, a).await, 60.0);
    assert_eq!(balance_of(&client, &srv, b).await, 40.0);

    let res = client
        .get(srv.url(&format!("/payment/v1/transactions/{b}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let history = body["transactions"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], tx["id"]);
}

#[tokio::test]
async fn insufficient_funds_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let a = create_account(&client, &srv, "Ada", "Lovelace").await;
    let b = create_account(&client, &srv, "Alan", "Turing").await;
    top_up(&client, &srv, a, 10.0).await;

    let res = transfer(&client, &srv, a, b, 50.0).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_funds");
    assert_eq!(body["message"], "insufficient funds, account with ID 1");

    assert_eq!(balance_of(&client, &srv, a).await, 10.0);
    assert_eq!(balance_of(&client, &srv, b).await, 0.0);
}

#[tokio::test]
async fn invalid_requests_map_to_client_errors() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let a = create_account(&client, &srv, "Ada", "Lovelace").await;

    let res = transfer(&client, &srv, a, a, 5.0).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = top_up(&client, &srv, a, -1.0).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = top_up(&client, &srv, 77, 5.0).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    let res = client.get(srv.url("/payment/v1/balance/77")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.get(srv.url("/payment/v1/transactions/x1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let a = create_account(&client, &srv, "Ada", "Lovelace").await;

    let bodies = [
        json!({ "from": a, "to": 2, "amount": "ten" }),
        json!({ "from": "x", "to": 2, "amount": 5 }),
        json!({ "from": a, "amount": 5 }),
    ];
    for body in bodies {
        let res = client
            .post(srv.url("/payment/v1/transfer"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "invalid_body");
        assert!(body["message"].is_string());
    }

    let res = client
        .post(srv.url("/payment/v1/topup"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");

    let res = client
        .post(srv.url("/account/v1/"))
        .body("first_name=Ada")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");

    assert_eq!(balance_of(&client, &srv, a).await, 0.0);
}

#[tokio::test]
async fn held_account_lock_is_a_conflict() {
    let ledger = InMemoryLedgerStore::new();
    let services = AppServices::new(
        Arc::new(InMemoryAccountStore::new()),
        Arc::new(ledger.clone()),
    );
    let srv = TestServer::with_services(services).await;
    let client = reqwest::Client::new();
    let a = create_account(&client, &srv, "Ada", "Lovelace").await;
    let b = create_account(&client, &srv, "Alan", "Turing").await;
    top_up(&client, &srv, a, 100.0).await;

    let mut holder = ledger.begin().await.unwrap();
    assert!(holder.try_lock(AccountId::new(b)).await.unwrap());

    let res = transfer(&client, &srv, a, b, 10.0).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "lock_unavailable");
    assert_eq!(body["message"], format!("unable to acquire lock for account with ID {b}"));
    assert_eq!(balance_of(&client, &srv, a).await, 100.0);

    holder.rollback().await.unwrap();
    let res = transfer(&client, &srv, a, b, 10.0).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(balance_of(&client, &srv, b).await, 10.0);
}
