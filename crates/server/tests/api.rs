use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine as _;
use chrono::{Datelike, Utc};
use http_body_util::BodyExt;
use ledger::ChainLedger;
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, Database, Set};
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, users};
use server::{ServerState, router};

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    for username in ["alice", "bob", "carol", "dave"] {
        users::ActiveModel {
            username: Set(username.to_string()),
            password: Set(format!("{username}-pw")),
            email: Set(Some(format!("{username}@club.test"))),
        }
        .insert(&db)
        .await
        .unwrap();
    }

    let engine = Engine::builder()
        .database(db.clone())
        .ledger(Arc::new(ChainLedger::disabled("no node in tests")))
        .workers(1)
        .build()
        .await
        .unwrap();

    router(ServerState {
        engine: Arc::new(engine),
        db,
    })
}

fn basic(username: &str) -> String {
    let credentials = format!("{username}:{username}-pw");
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(credentials)
    )
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, basic(user));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// alice creates the treasury and makes bob treasurer and carol member.
async fn seeded_treasury(app: &Router) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/treasuries",
        Some("alice"),
        Some(json!({ "name": "Club", "description": "weekly dues" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_str().unwrap().to_string();

    for (username, role) in [("bob", "treasurer"), ("carol", "member")] {
        let (status, _) = call(
            app,
            "POST",
            &format!("/treasuries/{id}/members"),
            Some("alice"),
            Some(json!({ "username": username, "role": role })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    id
}

#[tokio::test]
async fn health_needs_no_credentials() {
    let app = app().await;
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn credentials_are_required() {
    let app = app().await;
    let (status, _) = call(&app, "GET", "/treasuries", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::get("/treasuries")
        .header(
            header::AUTHORIZATION,
            format!(
                "Basic {}",
                base64::engine::general_purpose::STANDARD.encode("alice:wrong")
            ),
        )
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, body) = call(&app, "GET", "/treasuries", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["treasuries"], json!([]));
}

#[tokio::test]
async fn treasury_detail_lists_members() {
    let app = app().await;
    let id = seeded_treasury(&app).await;

    let (status, body) = call(&app, "GET", &format!("/treasuries/{id}"), Some("carol"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["treasury"]["name"], "Club");
    assert_eq!(body["members"].as_array().unwrap().len(), 3);

    let (status, body) = call(&app, "GET", &format!("/treasuries/{id}"), Some("dave"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn members_are_added_by_username_or_email() {
    let app = app().await;
    let id = seeded_treasury(&app).await;
    let members = format!("/treasuries/{id}/members");

    let (status, body) = call(
        &app,
        "POST",
        &members,
        Some("alice"),
        Some(json!({ "email": "dave@club.test" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "dave");
    assert_eq!(body["role"], "member");

    for payload in [
        json!({ "role": "member" }),
        json!({ "username": "dave", "email": "dave@club.test" }),
    ] {
        let (status, _) = call(&app, "POST", &members, Some("alice"), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = call(
        &app,
        "POST",
        &members,
        Some("alice"),
        Some(json!({ "email": "nobody@club.test" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn transaction_lifecycle_over_http() {
    let app = app().await;
    let id = seeded_treasury(&app).await;
    let transactions = format!("/treasuries/{id}/transactions");

    let (status, body) = call(
        &app,
        "POST",
        &transactions,
        Some("carol"),
        Some(json!({ "type": "income", "amount": "100.00", "note": "march dues" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["type"], "INCOME");
    assert_eq!(body["amount"], "100.00000000");
    assert_eq!(body["status"], "pending");
    let tx_id = body["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        "POST",
        &format!("{transactions}/{tx_id}/confirm"),
        Some("carol"),
        Some(json!({ "amount": "95" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
        &app,
        "POST",
        &format!("{transactions}/{tx_id}/confirm"),
        Some("bob"),
        Some(json!({ "amount": "95,00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["confirmed_amount"], "95.00000000");
    assert_eq!(body["confirmed_by"], "bob");
    assert!(body["chain_log"].is_object());

    let (status, _) = call(
        &app,
        "POST",
        &format!("{transactions}/{tx_id}/confirm"),
        Some("bob"),
        Some(json!({ "amount": "95" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call(
        &app,
        "GET",
        &format!("/treasuries/{id}/balance"),
        Some("carol"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_income"], "95.00000000");
    assert_eq!(body["balance"], "95.00000000");

    let (status, body) = call(&app, "GET", &transactions, Some("carol"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_input_is_a_bad_request() {
    let app = app().await;
    let id = seeded_treasury(&app).await;
    let transactions = format!("/treasuries/{id}/transactions");

    let (status, body) = call(
        &app,
        "POST",
        &transactions,
        Some("carol"),
        Some(json!({ "type": "INCOME", "amount": "ten" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid amount: ten");

    let (status, _) = call(
        &app,
        "POST",
        &transactions,
        Some("carol"),
        Some(json!({ "type": "INCOME", "amount": "0" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = call(
        &app,
        "POST",
        &transactions,
        Some("carol"),
        Some(json!({ "type": "TRANSFER", "amount": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = call(
        &app,
        "GET",
        &format!("{transactions}?status=bogus"),
        Some("carol"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn failed_notarization_can_be_retried() {
    let app = app().await;
    let id = seeded_treasury(&app).await;
    let transactions = format!("/treasuries/{id}/transactions");

    let (_, body) = call(
        &app,
        "POST",
        &transactions,
        Some("carol"),
        Some(json!({ "type": "EXPENSE", "amount": "12.5" })),
    )
    .await;
    let tx_id = body["id"].as_str().unwrap().to_string();
    call(
        &app,
        "POST",
        &format!("{transactions}/{tx_id}/confirm"),
        Some("bob"),
        Some(json!({ "amount": "12.5" })),
    )
    .await;

    // the disabled ledger fails every submission
    let chain_log = format!("{transactions}/{tx_id}/chain-log");
    let mut log = Value::Null;
    for _ in 0..50 {
        let (status, body) = call(&app, "GET", &chain_log, Some("carol"), None).await;
        assert_eq!(status, StatusCode::OK);
        log = body;
        if log["status"] == "failed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(log["status"], "failed");
    assert!(log["error_detail"].as_str().unwrap().contains("not configured"));

    let (status, _) = call(
        &app,
        "POST",
        &format!("{chain_log}/retry"),
        Some("carol"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
        &app,
        "POST",
        &format!("{chain_log}/retry"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn reports_default_to_current_year() {
    let app = app().await;
    let id = seeded_treasury(&app).await;
    let transactions = format!("/treasuries/{id}/transactions");

    let (_, body) = call(
        &app,
        "POST",
        &transactions,
        Some("carol"),
        Some(json!({ "type": "INCOME", "amount": "40" })),
    )
    .await;
    let tx_id = body["id"].as_str().unwrap().to_string();
    call(
        &app,
        "POST",
        &format!("{transactions}/{tx_id}/confirm"),
        Some("alice"),
        Some(json!({ "amount": "40" })),
    )
    .await;

    let (status, body) = call(
        &app,
        "GET",
        &format!("/treasuries/{id}/reports/income-by-member"),
        Some("carol"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"][0]["username"], "carol");
    assert_eq!(body["rows"][0]["total"], "40.00000000");

    let last_year = Utc::now().year() - 1;
    let (_, body) = call(
        &app,
        "GET",
        &format!("/treasuries/{id}/reports/income-by-member?year={last_year}"),
        Some("carol"),
        None,
    )
    .await;
    assert_eq!(body["rows"], json!([]));

    let (status, body) = call(
        &app,
        "GET",
        &format!("/treasuries/{id}/reports/top-contributors"),
        Some("carol"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"].as_array().unwrap().len(), 1);

    let (status, body) = call(
        &app,
        "GET",
        &format!("/treasuries/{id}/reports/yearly-summary"),
        Some("carol"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"][0]["year"], Utc::now().year());
}

#[tokio::test]
async fn bank_account_round_trip() {
    let app = app().await;
    let id = seeded_treasury(&app).await;
    let path = format!("/treasuries/{id}/bank-account");

    let (status, _) = call(&app, "GET", &path, Some("carol"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let payload = json!({
        "bank_name": "First Bank",
        "account_number": "123-456",
        "account_name": "Club",
        "qr_code_url": null
    });
    let (status, _) = call(&app, "PUT", &path, Some("bob"), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = call(&app, "PUT", &path, Some("alice"), Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bank_name"], "First Bank");

    let (status, _) = call(&app, "DELETE", &path, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
