pub mod database;
pub mod sqlite;

pub use database::*;
pub use sqlite::*;

use async_trait::async_trait;

use crate::core::{NewTodo, StorageError, Todo, TodoQuery};

/// Persistence port for todos. Each method runs as a single transaction.
#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn create(&self, todo: NewTodo) -> Result<Todo, StorageError>;
    async fn list(&self, query: &TodoQuery) -> Result<Vec<Todo>, StorageError>;
    /// Replaces every mutable column. `None` when no row has this id.
    async fn update(&self, id: i64, todo: NewTodo) -> Result<Option<Todo>, StorageError>;
    /// Removes the row and returns what it held. `None` when no row has this id.
    async fn delete(&self, id: i64) -> Result<Option<Todo>, StorageError>;
}
