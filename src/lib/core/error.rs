use thiserror::Error;

/// Failures that originate in the storage layer, classified by what the
/// caller can do about them.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Table missing: {0}")]
    SchemaMissing(String),
    #[error("Connection unavailable: {0}")]
    ConnectionUnavailable(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_) => StorageError::ConnectionUnavailable(err.to_string()),
            other => {
                let message = other.to_string();
                let lowered = message.to_lowercase();
                if lowered.contains("no such table")
                    || lowered.contains("does not exist")
                    || lowered.contains("undefinedtable")
                {
                    StorageError::SchemaMissing(message)
                } else if lowered.contains("could not connect")
                    || lowered.contains("connection refused")
                    || lowered.contains("unable to open database")
                {
                    StorageError::ConnectionUnavailable(message)
                } else {
                    StorageError::Other(message)
                }
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum TodoError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Todo {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
