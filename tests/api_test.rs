mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use bankist::http::{AppState, create_router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use common::{seed_demo, test_service};

async fn demo_app() -> (Router, TempDir) {
    let (service, temp) = test_service().await.unwrap();
    seed_demo(&service).await.unwrap();
    (create_router(AppState::new(service)), temp)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_check() {
    let (app, _temp) = demo_app().await;

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn list_accounts_hides_pins() {
    let (app, _temp) = demo_app().await;

    let (status, body) = get(&app, "/accounts").await;
    assert_eq!(status, StatusCode::OK);

    let accounts = body.as_array().unwrap();
    assert_eq!(accounts.len(), 4);
    assert_eq!(accounts[0]["owner"], "Jonas Schmedtmann");
    assert_eq!(accounts[0]["username"], "js");
    assert_eq!(accounts[0]["interestRate"], 1.2);
    assert_eq!(accounts[0]["balance"], "3840.00");
    assert!(accounts.iter().all(|a| a.get("pin").is_none()));
}

#[tokio::test]
async fn get_account_by_id_and_username() {
    let (app, _temp) = demo_app().await;

    let (status, body) = get(&app, "/accounts/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "jd");

    let (status, body) = get(&app, "/accounts/by-username/stw").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner"], "Steven Thomas Williams");
    assert_eq!(body["balance"], "10.00");

    let (status, body) = get(&app, "/accounts/by-username/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn list_movements() {
    let (app, _temp) = demo_app().await;

    let (status, body) = get(&app, "/movements/1").await;
    assert_eq!(status, StatusCode::OK);
    let movements = body.as_array().unwrap();
    assert_eq!(movements.len(), 8);
    assert_eq!(movements[0]["movement"], "200.00");
    assert_eq!(movements[2]["movement"], "-400.00");
    assert_eq!(movements[0]["kind"], "opening");

    let (status, body) = get(&app, "/movements/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let (status, body) = get(&app, "/movements/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");
}

#[tokio::test]
async fn account_summary() {
    let (app, _temp) = demo_app().await;

    let (status, body) = get(&app, "/accounts/1/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], "3840.00");
    assert_eq!(body["incomes"], "5020.00");
    assert_eq!(body["outgoings"], "1180.00");
    assert_eq!(body["interest"], "59.40");
}

#[tokio::test]
async fn transfer_success() {
    let (app, _temp) = demo_app().await;

    let (status, body) = post(
        &app,
        "/transfer",
        r#"{"senderId": 1, "receiverId": 2, "amount": 40}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Transfer successful");
    assert_eq!(body["amount"], "40.00");
    assert!(body["debitMovementId"].is_i64());

    let (_, sender) = get(&app, "/accounts/1").await;
    assert_eq!(sender["balance"], "3800.00");
    let (_, receiver) = get(&app, "/accounts/2").await;
    assert_eq!(receiver["balance"], "11760.00");
}

#[tokio::test]
async fn transfer_rejections() {
    let (app, _temp) = demo_app().await;

    let (status, body) = post(
        &app,
        "/transfer",
        r#"{"senderId": 1, "receiverId": 1, "amount": 10}"#,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "policy_violation");

    let (status, _) = post(
        &app,
        "/transfer",
        r#"{"senderId": 3, "receiverId": 1, "amount": "10.01"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = post(
        &app,
        "/transfer",
        r#"{"senderId": 1, "receiverId": 2, "amount": 0}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");

    let (status, _) = post(
        &app,
        "/transfer",
        r#"{"senderId": 1, "receiverId": 2, "amount": "1.234"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(
        &app,
        "/transfer",
        r#"{"senderId": 1, "receiverId": 99, "amount": 10}"#,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = post(&app, "/transfer", r#"{"senderId": 1,"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");

    let (status, _) = post(&app, "/transfer", r#"{"senderId": 1, "amount": 10}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, sender) = get(&app, "/accounts/1").await;
    assert_eq!(sender["balance"], "3840.00");
}

#[tokio::test]
async fn loan_granted_and_refused() {
    let (app, _temp) = demo_app().await;

    let (status, body) = post(&app, "/loan", r#"{"accountId": 2, "amount": 100}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Loan request successful");
    assert_eq!(body["accountId"], 2);
    assert_eq!(body["amount"], "100.00");

    let (_, account) = get(&app, "/accounts/2").await;
    assert_eq!(account["balance"], "11820.00");

    let (status, body) = post(&app, "/loan", r#"{"accountId": 3, "amount": 5}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "policy_violation");

    let (status, _) = post(&app, "/loan", r#"{"accountId": 3, "amount": -1}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&app, "/loan", r#"{"accountId": 42, "amount": 1}"#).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_ledger_lists_nothing() {
    let (service, _temp) = test_service().await.unwrap();
    let app = create_router(AppState::new(service));

    let (status, body) = get(&app, "/accounts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn policy_errors_render_money_amounts() {
    let (app, _temp) = demo_app().await;

    let (status, body) = post(&app, "/loan", r#"{"accountId": 3, "amount": 5}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["error"],
        "Loan of 5.00 exceeds 10% of the balance of account 3 (at most 1.00)"
    );

    let (status, body) = post(
        &app,
        "/transfer",
        r#"{"senderId": 3, "receiverId": 1, "amount": "10.01"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["error"],
        "Insufficient balance in account 3: balance 10.00, required 10.01"
    );
}

#[tokio::test]
async fn health_check_hides_storage_details() {
    let (service, _temp) = test_service().await.unwrap();
    let pool = service.repository().pool().clone();
    let app = create_router(AppState::new(service));

    pool.close().await;

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["error"], "Storage is unreachable");
}
