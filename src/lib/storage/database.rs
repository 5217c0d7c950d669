use std::time::Duration;

use sqlx::migrate::MigrateDatabase;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, instrument};

use crate::core::StorageError;

/// A request-scoped connection. Returned to the pool when dropped.
pub type Session = PoolConnection<Sqlite>;

const MEMORY_URL: &str = "sqlite::memory:";

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS todo (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        completed BOOLEAN NOT NULL DEFAULT 0,
        priority INTEGER NOT NULL DEFAULT 5 CHECK (priority BETWEEN 1 AND 10),
        due_date DATE,
        category TEXT
    )",
    "CREATE INDEX IF NOT EXISTS ix_todo_title ON todo (title)",
    "CREATE INDEX IF NOT EXISTS ix_todo_due_date ON todo (due_date)",
    "CREATE INDEX IF NOT EXISTS ix_todo_category ON todo (category)",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

/// Process-wide handle to the connection pool. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(url: &str, settings: &DatabaseSettings) -> Result<Self, StorageError> {
        let url = normalize_database_url(url);
        info!(url = %redact_url(&url), "Connecting to database");

        if url != MEMORY_URL && !Sqlite::database_exists(&url).await.unwrap_or(false) {
            info!(url = %redact_url(&url), "Creating database");
            Sqlite::create_database(&url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .test_before_acquire(true)
            .connect(&url)
            .await?;
        Ok(Self { pool })
    }

    /// Single-connection in-memory database. The connection is never recycled,
    /// so the data lives as long as the pool.
    pub async fn new_memory() -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(Duration::from_secs(10))
            .connect(MEMORY_URL)
            .await?;
        Ok(Self { pool })
    }

    pub async fn acquire_session(&self) -> Result<Session, StorageError> {
        Ok(self.pool.acquire().await?)
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, StorageError> {
        Ok(self.pool.begin().await?)
    }

    /// Creates the todo table and its indexes if missing, then checks the
    /// table can be read.
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        let mut tx = self.begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        sqlx::query("SELECT id FROM todo LIMIT 0")
            .execute(&self.pool)
            .await?;
        info!("Todo table verified and accessible");
        Ok(())
    }

    /// Reachability probe: acquires a session and reads from the todo table.
    pub async fn ping(&self) -> Result<(), StorageError> {
        let mut session = self.acquire_session().await?;
        sqlx::query("SELECT id FROM todo LIMIT 1")
            .execute(&mut *session)
            .await?;
        debug!("Database ping succeeded");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

/// Rewrites a connection string into the `sqlite://` form sqlx expects.
/// Bare paths and `sqlite3://` URLs are accepted. A missing database file is
/// created by [`Database::connect`], not through the URL.
pub fn normalize_database_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw == ":memory:" || raw == MEMORY_URL {
        return MEMORY_URL.to_string();
    }
    if let Some(rest) = raw.strip_prefix("sqlite3://") {
        return format!("sqlite://{rest}");
    }
    if raw.starts_with("sqlite:") || raw.contains("://") {
        return raw.to_string();
    }
    format!("sqlite://{raw}")
}

/// First 30 characters of a URL, for logs.
pub fn redact_url(url: &str) -> String {
    let prefix: String = url.chars().take(30).collect();
    if prefix.len() < url.len() {
        format!("{prefix}...")
    } else {
        prefix
    }
}
