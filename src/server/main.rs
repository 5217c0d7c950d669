use anyhow::Context;
use todo_service::adapters::{AppState, HttpServer, HttpServerConfig, shutdown_signal};
use todo_service::config::Config;
use todo_service::storage::{Database, redact_url};
use tracing::{error, info};

const TROUBLESHOOTING: &str = "check DATABASE_URL in your environment or .env file, \
    and that the database location is writable";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let check_only = std::env::args().skip(1).any(|arg| arg == "--check-db");
    let config = Config::from_env().context("invalid configuration")?;
    info!(url = %redact_url(&config.database_url), "Starting todo service");

    let database = Database::connect(&config.database_url, &config.database)
        .await
        .inspect_err(|err| error!(error = %err, "Could not connect to database; {TROUBLESHOOTING}"))
        .context("could not connect to database")?;
    database
        .ensure_schema()
        .await
        .inspect_err(|err| error!(error = %err, "Could not create database tables; {TROUBLESHOOTING}"))
        .context("could not create database tables")?;

    if check_only {
        database.ping().await.context("todo table is not accessible")?;
        info!("All checks passed, database is ready");
        database.close().await;
        return Ok(());
    }

    let http_config = HttpServerConfig {
        addr: config.bind_addr(),
        cors_origins: config.cors_origins.clone(),
    };
    let server = HttpServer::new(AppState::new(database.clone()), &http_config).await?;
    info!("Todo service startup complete");
    let result = server.run(shutdown_signal()).await;
    database.close().await;
    result
}
