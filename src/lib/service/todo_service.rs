use tracing::{error, info, instrument, warn};

use crate::core::{Todo, TodoError, TodoPayload, TodoQuery};
use crate::storage::TodoRepository;

/// CRUD operations over a [`TodoRepository`]. Payloads are validated before
/// any storage call, so a rejected request never writes.
#[derive(Debug, Clone)]
pub struct TodoService<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, payload), fields(title = %payload.title))]
    pub async fn create(&self, payload: TodoPayload) -> Result<Todo, TodoError> {
        let todo = payload.validate()?;
        match self.repo.create(todo).await {
            Ok(todo) => {
                info!(id = todo.id, title = %todo.title, "Todo created");
                Ok(todo)
            }
            Err(err) => {
                error!(error = %err, "Error creating todo");
                Err(err.into())
            }
        }
    }

    /// Best-effort read: a storage failure is logged and yields an empty list,
    /// unlike the other operations which report it.
    #[instrument(skip(self))]
    pub async fn list(&self, query: TodoQuery) -> Vec<Todo> {
        match self.repo.list(&query).await {
            Ok(todos) => todos,
            Err(err) => {
                warn!(error = %err, "Database error while listing todos, returning empty list");
                Vec::new()
            }
        }
    }

    /// Full replace: optional fields missing from the payload become null.
    #[instrument(skip(self, payload))]
    pub async fn update(&self, id: i64, payload: TodoPayload) -> Result<Todo, TodoError> {
        let todo = payload.validate()?;
        let updated = self
            .repo
            .update(id, todo)
            .await?
            .ok_or(TodoError::NotFound(id))?;
        info!(id, "Todo updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<Todo, TodoError> {
        let deleted = self.repo.delete(id).await?.ok_or(TodoError::NotFound(id))?;
        info!(id, "Todo deleted");
        Ok(deleted)
    }
}
