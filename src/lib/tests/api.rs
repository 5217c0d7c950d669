use axum::Router;
use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::adapters::{AppState, HttpServer, HttpServerConfig, SCHEMA_MISSING_HINT, router};
use crate::core::Todo;
use crate::storage::Database;

async fn app() -> (Router, Database) {
    let db = Database::new_memory().await.unwrap();
    db.ensure_schema().await.unwrap();
    (router(AppState::new(db.clone()), &[]), db)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(http::header::CONTENT_TYPE, "application/json");
            json.to_string()
        }
        None => String::new(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create(app: &Router, body: Value) -> Todo {
    let (status, value) = send(app, "POST", "/api/todos/new", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{value}");
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn create_returns_stored_record_with_defaults() {
    let (app, _db) = app().await;
    let todo = create(&app, json!({ "id": 77, "title": "buy milk" })).await;
    assert_ne!(todo.id, 77);
    assert_eq!(todo.priority, 5);
    assert!(!todo.completed);
    assert_eq!(todo.due_date, None);
}

#[tokio::test]
async fn create_rejects_bad_input_with_400() {
    let (app, _db) = app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/todos/new",
        Some(json!({ "title": "x", "due_date": "2025/01/01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("Expected YYYY-MM-DD"));

    let (status, _) = send(
        &app,
        "POST",
        "/api/todos/new",
        Some(json!({ "title": "x", "priority": 11 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = send(&app, "GET", "/api/todos", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn list_applies_query_parameters() {
    let (app, _db) = app().await;
    let milk = create(&app, json!({ "title": "buy milk", "category": "home", "priority": 2 })).await;
    let report = create(
        &app,
        json!({ "title": "write report", "completed": true, "category": "work", "priority": 8 }),
    )
    .await;

    let ids = |value: Value| -> Vec<i64> {
        serde_json::from_value::<Vec<Todo>>(value)
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect()
    };

    let (status, body) = send(&app, "GET", "/api/todos?search=milk&status=undone", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(body), vec![milk.id]);

    let (_, body) = send(&app, "GET", "/api/todos?status=done", None).await;
    assert_eq!(ids(body), vec![report.id]);

    let (_, body) = send(&app, "GET", "/api/todos?category=home", None).await;
    assert_eq!(ids(body), vec![milk.id]);

    let (_, body) = send(&app, "GET", "/api/todos?sort_by=priority_desc", None).await;
    assert_eq!(ids(body), vec![report.id, milk.id]);

    let (_, body) = send(&app, "GET", "/api/todos?status=whatever&sort_by=nonsense&search=", None).await;
    assert_eq!(ids(body), vec![report.id, milk.id]);
}

#[tokio::test]
async fn update_replaces_record_and_404s_for_unknown_id() {
    let (app, _db) = app().await;
    let todo = create(
        &app,
        json!({ "title": "draft", "category": "work", "due_date": "2025-03-01" }),
    )
    .await;

    let uri = format!("/api/todos/{}", todo.id);
    let (status, body) = send(&app, "PUT", &uri, Some(json!({ "title": "final", "completed": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "final");
    assert_eq!(body["completed"], true);
    assert!(body["category"].is_null());
    assert!(body["due_date"].is_null());

    let (status, body) = send(&app, "PUT", "/api/todos/9999", Some(json!({ "title": "x" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Todo not found");
}

#[tokio::test]
async fn delete_and_legacy_delete_return_prior_state() {
    let (app, _db) = app().await;
    let first = create(&app, json!({ "title": "one" })).await;
    let second = create(&app, json!({ "title": "two" })).await;

    let (status, body) = send(&app, "DELETE", &format!("/api/todos/{}", first.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "one");

    let (status, body) = send(&app, "POST", &format!("/api/delete/{}", second.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "two");

    let (status, _) = send(&app, "DELETE", &format!("/api/todos/{}", first.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = send(&app, "GET", "/api/todos", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn health_reports_database_state_without_failing() {
    let (app, db) = app().await;
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "server": "running", "database": "connected" }));

    db.close().await;
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let database = body["database"].as_str().unwrap();
    assert!(database.starts_with("disconnected: "));
    assert!(database.len() <= "disconnected: ".len() + 100);

    let (status, list) = send(&app, "GET", "/api/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));

    let (status, _) = send(&app, "POST", "/api/todos/new", Some(json!({ "title": "x" }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn missing_table_is_reported_and_init_db_recovers() {
    let db = Database::new_memory().await.unwrap();
    let app = router(AppState::new(db), &[]);

    let (status, body) = send(&app, "POST", "/api/todos/new", Some(json!({ "title": "x" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], SCHEMA_MISSING_HINT);

    let (status, body) = send(&app, "POST", "/api/init-db", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    create(&app, json!({ "title": "x" })).await;
}

#[tokio::test]
async fn root_banner_is_served() {
    let (app, _db) = app().await;
    let (status, body) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api"], "/api");
}

#[tokio::test]
async fn server_stops_when_shutdown_resolves() {
    let (_, db) = app().await;
    let config = HttpServerConfig {
        addr: "127.0.0.1:0".to_string(),
        cors_origins: Vec::new(),
    };
    let server = HttpServer::new(AppState::new(db.clone()), &config).await.unwrap();
    assert_ne!(server.local_addr().unwrap().port(), 0);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(server.run(async {
        let _ = stop_rx.await;
    }));
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
    db.close().await;
    assert!(db.is_closed());
}
