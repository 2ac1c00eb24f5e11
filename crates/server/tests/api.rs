use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use engine::{Engine, RecordingMailer};
use migration::MigratorTrait;
use server::{AuthConfig, AuthManager, EventBus, LocalBlobStore, ServerState, router};

const RESET_URL: &str = "https://kharcha.test/reset-password";

struct TestApp {
    router: Router,
    events: EventBus,
    db: DatabaseConnection,
    mailer: RecordingMailer,
    upload_dir: PathBuf,
}

async fn app() -> (Router, EventBus) {
    let test = test_app().await;
    (test.router, test.events)
}

async fn test_app() -> TestApp {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let events = EventBus::new(32);
    let mailer = RecordingMailer::new();
    let engine = Engine::builder()
        .database(db.clone())
        .notifier(Arc::new(events.clone()))
        .mailer(Arc::new(mailer.clone()))
        .build()
        .await
        .unwrap();
    let upload_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../target/test_uploads")
        .join(Uuid::new_v4().to_string());
    let state = ServerState {
        engine: Arc::new(engine),
        auth: Arc::new(AuthManager::new(&AuthConfig {
            jwt_secret: b"kharcha-test-secret-kharcha-test".to_vec(),
            access_token_ttl: Duration::from_secs(3600),
        })),
        events: events.clone(),
        blobs: Arc::new(LocalBlobStore::new(upload_dir.clone(), "/uploads")),
        upload_dir: upload_dir.clone(),
        reset_url: RESET_URL.to_string(),
    };
    TestApp {
        router: router(state),
        events,
        db,
        mailer,
        upload_dir,
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
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

async fn login(app: &Router, email: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/users/register",
        None,
        Some(json!({ "email": email, "password": "s3cret-pass", "full_name": "Test" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({ "email": email, "password": "s3cret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_account(app: &Router, token: &str, number: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/accounts",
        Some(token),
        Some(json!({
            "account_type": "Savings",
            "branch_name": "MG Road",
            "account_number": number,
            "bank_name": "Canara",
            "balance_minor": 10_000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn protected_routes_require_bearer_token() {
    let (app, _) = app().await;
    let (status, body) = send(&app, Method::GET, "/api/accounts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::GET, "/api/users/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let (app, _) = app().await;
    login(&app, "alice@example.com").await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "nope-nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn transaction_lifecycle_keeps_balance() {
    let (app, events) = app().await;
    let mut rx = events.subscribe();
    let token = login(&app, "alice@example.com").await;
    let account_id = create_account(&app, &token, "001").await;

    let (status, tx) = send(
        &app,
        Method::POST,
        "/api/transactions",
        Some(&token),
        Some(json!({
            "account_id": account_id,
            "kind": "expense",
            "amount_minor": 2_500,
            "title": "Groceries",
            "method": "Debit Card"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(tx["status"], "Complete");
    let tx_id = tx["id"].as_str().unwrap().to_string();

    let uri = format!("/api/accounts/{account_id}");
    let (_, detail) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(detail["account"]["balance_minor"], 7_500);
    assert_eq!(detail["transactions"].as_array().unwrap().len(), 1);

    let tx_uri = format!("/api/transactions/{tx_id}");
    let (status, _) = send(
        &app,
        Method::PUT,
        &tx_uri,
        Some(&token),
        Some(json!({ "kind": "income" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, detail) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(detail["account"]["balance_minor"], 12_500);

    let (status, _) = send(&app, Method::DELETE, &tx_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, detail) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(detail["account"]["balance_minor"], 10_000);

    let (_, summary) = send(
        &app,
        Method::GET,
        "/api/transactions/summary",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(summary["total_balance_minor"], 10_000);

    let first = rx.recv().await.unwrap();
    assert_eq!(first.payload.message, "New account created: Canara (Savings)");
    let second = rx.recv().await.unwrap();
    assert_eq!(second.payload.message, "New transaction created: expense - 25.00");
}

#[tokio::test]
async fn invalid_amount_is_unprocessable() {
    let (app, _) = app().await;
    let token = login(&app, "alice@example.com").await;
    let account_id = create_account(&app, &token, "001").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/transactions",
        Some(&token),
        Some(json!({ "account_id": account_id, "kind": "income", "amount_minor": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("amount"));
}

#[tokio::test]
async fn other_users_see_not_found() {
    let (app, _) = app().await;
    let alice = login(&app, "alice@example.com").await;
    let bob = login(&app, "bob@example.com").await;
    let account_id = create_account(&app, &alice, "001").await;

    let uri = format!("/api/accounts/{account_id}");
    let (status, _) = send(&app, Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/transactions",
        Some(&bob),
        Some(json!({ "account_id": account_id, "kind": "income", "amount_minor": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comparison_defaults_to_monthly_and_rejects_unknown_filter() {
    let (app, _) = app().await;
    let token = login(&app, "alice@example.com").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/expenses/analytics/comparison",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filter"], "monthly");
    assert_eq!(body["data"].as_array().unwrap().len(), 12);
    assert_eq!(body["data"][0]["label"], "Jan");

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/expenses/analytics/comparison?filter=yearly",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 5);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/expenses/analytics/comparison?filter=hourly",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn breakdown_groups_expenses() {
    let (app, _) = app().await;
    let token = login(&app, "alice@example.com").await;
    let expenses = [
        ("Cab", "Transport", 300),
        ("Lunch", "Food", 250),
        ("Dinner", "Food", 450),
    ];
    for (title, category, amount) in expenses {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/expenses",
            Some(&token),
            Some(json!({ "title": title, "category": category, "amount_minor": amount })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/expenses/analytics/breakdown",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["category"], "Food");
    assert_eq!(body["data"][0]["total_minor"], 700);
    assert_eq!(body["data"][0]["change_percent"], 0);
    assert_eq!(body["data"][1]["category"], "Transport");
}

#[tokio::test]
async fn goals_and_bills_crud() {
    let (app, _) = app().await;
    let token = login(&app, "alice@example.com").await;

    let (status, goal) = send(
        &app,
        Method::POST,
        "/api/goals",
        Some(&token),
        Some(json!({
            "title": "Vacation",
            "target_amount_minor": 50_000,
            "current_amount_minor": 15_000,
            "deadline": "2026-06-30T00:00:00+05:30"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(goal["progress_percent"], 30);

    let (status, bill) = send(
        &app,
        Method::POST,
        "/api/bills",
        Some(&token),
        Some(json!({
            "vendor": "Netflix",
            "plan": "Premium",
            "due_date": "2026-01-05T00:00:00Z",
            "amount_minor": 64_900
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/bills/{}", bill["id"].as_str().unwrap());
    let (status, updated) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({ "plan": "Basic", "amount_minor": 19_900 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["plan"], "Basic");

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

const BOUNDARY: &str = "kharcha-test-boundary";

fn multipart_body(full_name: &str, avatar: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"full_name\"\r\n\r\n{full_name}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"avatar\"; filename=\"me.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(avatar);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload_avatar(app: &Router, token: &str, full_name: &str, avatar: &[u8]) -> Value {
    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/users/update")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(full_name, avatar)))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn blob_file(test: &TestApp, avatar_url: &Value) -> PathBuf {
    let url = avatar_url.as_str().unwrap();
    let name = url.strip_prefix("/uploads/").unwrap();
    test.upload_dir.join(name)
}

#[tokio::test]
async fn profile_update_replaces_avatar_file() {
    let test = test_app().await;
    let token = login(&test.router, "alice@example.com").await;

    let first = upload_avatar(&test.router, &token, "Alice A.", b"first-png").await;
    assert_eq!(first["full_name"], "Alice A.");
    let first_file = blob_file(&test, &first["avatar_url"]);
    assert_eq!(std::fs::read(&first_file).unwrap(), b"first-png");

    let (status, _) = send(
        &test.router,
        Method::GET,
        first["avatar_url"].as_str().unwrap(),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let second = upload_avatar(&test.router, &token, "Alice B.", b"second-png").await;
    let second_file = blob_file(&test, &second["avatar_url"]);
    assert_ne!(first_file, second_file);
    assert!(!first_file.exists());
    assert_eq!(std::fs::read(&second_file).unwrap(), b"second-png");

    let (_, me) = send(&test.router, Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(me["avatar_url"], second["avatar_url"]);
    assert_eq!(me["full_name"], "Alice B.");
}

#[tokio::test]
async fn reconcile_repairs_drifted_balance() {
    let test = test_app().await;
    let token = login(&test.router, "alice@example.com").await;
    let account_id = create_account(&test.router, &token, "ACC-1").await;

    let (status, clean) = send(
        &test.router,
        Method::POST,
        "/api/accounts/reconcile",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(clean["repaired"], json!([]));

    let backend = test.db.get_database_backend();
    test.db
        .execute(Statement::from_sql_and_values(
            backend,
            "UPDATE accounts SET balance_minor = ? WHERE id = ?",
            vec![1_i64.into(), account_id.clone().into()],
        ))
        .await
        .unwrap();

    let (status, body) = send(
        &test.router,
        Method::POST,
        "/api/accounts/reconcile",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["repaired"],
        json!([{ "account_id": account_id, "stored_minor": 1, "expected_minor": 10_000 }])
    );

    let (_, detail) = send(
        &test.router,
        Method::GET,
        &format!("/api/accounts/{account_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(detail["account"]["balance_minor"], 10_000);
}

#[tokio::test]
async fn notification_stream_delivers_events() {
    let test = test_app().await;
    let token = login(&test.router, "alice@example.com").await;

    let request = Request::builder()
        .uri("/api/notifications/stream")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = test.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("text/event-stream"));

    create_account(&test.router, &token, "ACC-1").await;

    let mut body = response.into_body();
    let mut received = String::new();
    while !received.contains("New account created") {
        let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Ok(data) = frame.into_data() {
            received.push_str(&String::from_utf8_lossy(&data));
        }
    }
    assert!(received.contains("event: notification"));
    assert!(received.contains("New account created: Canara (Savings)"));

    let (status, _) = send(&test.router, Method::GET, "/api/notifications/stream", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn change_password_over_http() {
    let (app, _) = app().await;
    let token = login(&app, "alice@example.com").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/users/change-password",
        Some(&token),
        Some(json!({ "old_password": "wrong-old-pass", "new_password": "brand-new-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/users/change-password",
        Some(&token),
        Some(json!({ "old_password": "s3cret-pass", "new_password": "brand-new-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password updated");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "brand-new-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn password_reset_over_http() {
    let test = test_app().await;
    login(&test.router, "alice@example.com").await;

    // Unknown and known emails get the same answer.
    let (status, unknown) = send(
        &test.router,
        Method::POST,
        "/api/users/reset",
        None,
        Some(json!({ "email": "nobody@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, known) = send(
        &test.router,
        Method::POST,
        "/api/users/reset",
        None,
        Some(json!({ "email": "alice@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unknown, known);

    let sent = test.mailer.messages();
    assert_eq!(sent.len(), 1);
    let prefix = format!("{RESET_URL}/");
    let start = sent[0].html.find(&prefix).unwrap() + prefix.len();
    let token: String = sent[0].html[start..]
        .chars()
        .take_while(char::is_ascii_hexdigit)
        .collect();

    let (status, body) = send(
        &test.router,
        Method::POST,
        &format!("/api/users/reset/{token}"),
        None,
        Some(json!({ "password": "brand-new-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password reset");

    let (status, _) = send(
        &test.router,
        Method::POST,
        &format!("/api/users/reset/{token}"),
        None,
        Some(json!({ "password": "another-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &test.router,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "brand-new-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
