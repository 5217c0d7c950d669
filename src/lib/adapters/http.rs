use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    routing::{get, post, put},
};
use serde_json::{Value, json};
use tokio::net;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::adapters::ApiError;
use crate::core::{ListParams, Todo, TodoPayload};
use crate::service::TodoService;
use crate::storage::{Database, SqliteTodoRepository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpServerConfig {
    pub addr: String,
    pub cors_origins: Vec<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub todo_service: Arc<TodoService<SqliteTodoRepository>>,
    pub database: Database,
}

impl AppState {
    pub fn new(database: Database) -> Self {
        let repo = SqliteTodoRepository::new(database.clone());
        Self {
            todo_service: Arc::new(TodoService::new(repo)),
            database,
        }
    }
}

pub async fn create_todo(
    State(state): State<AppState>,
    Json(body): Json<TodoPayload>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let item = state
        .todo_service
        .create(body)
        .await
        .map_err(ApiError::from_create)?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_todos(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<Todo>> {
    Json(state.todo_service.list(params.into()).await)
}

pub async fn put_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<TodoPayload>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.todo_service.update(id, body).await?))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.todo_service.delete(id).await?))
}

async fn root_route() -> Json<Value> {
    Json(json!({ "message": "Todo service is running", "api": "/api" }))
}

/// Always 200; the `database` field reports reachability.
async fn health_route(State(state): State<AppState>) -> Json<Value> {
    let database = match state.database.ping().await {
        Ok(()) => "connected".to_string(),
        Err(err) => {
            let reason: String = err.to_string().chars().take(100).collect();
            format!("disconnected: {reason}")
        }
    };
    Json(json!({
        "status": "ok",
        "server": "running",
        "database": database,
    }))
}

async fn init_db_route(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    info!("Manually creating database tables");
    state.database.ensure_schema().await.map_err(|err| {
        warn!(error = %err, "Error creating tables");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to create tables: {err}"),
        )
    })?;
    Ok(Json(json!({
        "status": "success",
        "message": "Database tables created successfully!",
    })))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/todos", get(get_todos))
        .route("/todos/new", post(create_todo))
        .route("/todos/{id}", put(put_todo).delete(delete_todo))
        .route("/delete/{id}", post(delete_todo))
        .route("/init-db", post(init_db_route))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request<_>| {
            let uri = request.uri().to_string();
            tracing::info_span!("http_request", method = ?request.method(), uri)
        });

    Router::new()
        .route("/", get(root_route))
        .route("/health", get(health_route))
        .nest("/api", api_routes())
        .layer(cors_layer(cors_origins))
        .layer(trace_layer)
        .with_state(state)
}

pub struct HttpServer {
    router: Router,
    listener: net::TcpListener,
}

impl HttpServer {
    pub async fn new(state: AppState, config: &HttpServerConfig) -> anyhow::Result<Self> {
        let router = router(state, &config.cors_origins);
        let listener = net::TcpListener::bind(&config.addr)
            .await
            .with_context(|| format!("failed to listen on {}", config.addr))?;
        Ok(Self { router, listener })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("listener has no local address")
    }

    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
        info!(addr = %self.local_addr()?, "HTTP server started");
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("received error from running server")?;
        Ok(())
    }
}

/// Resolves on Ctrl-C, or on SIGTERM where the platform has it.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
