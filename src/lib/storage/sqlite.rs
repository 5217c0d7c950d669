use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::core::{NewTodo, StorageError, Todo, TodoQuery};
use crate::storage::{Database, TodoRepository};

const RETURNING: &str = " RETURNING id, title, completed, priority, due_date, category";

#[derive(Debug, Clone)]
pub struct SqliteTodoRepository {
    db: Database,
}

impl SqliteTodoRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    #[instrument(skip(self, todo), fields(title = %todo.title))]
    async fn create(&self, todo: NewTodo) -> Result<Todo, StorageError> {
        let mut tx = self.db.begin().await?;
        let inserted = sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todo (title, completed, priority, due_date, category) \
             VALUES (?, ?, ?, ?, ?){RETURNING}"
        ))
        .bind(todo.title)
        .bind(todo.completed)
        .bind(todo.priority.get())
        .bind(todo.due_date)
        .bind(todo.category)
        .fetch_one(&mut *tx)
        .await;

        match inserted {
            Ok(row) => {
                tx.commit().await?;
                debug!(id = row.id, "Inserted todo");
                Ok(row)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed insert also failed");
                }
                Err(err.into())
            }
        }
    }

    #[instrument(skip(self))]
    async fn list(&self, query: &TodoQuery) -> Result<Vec<Todo>, StorageError> {
        let mut session = self.db.acquire_session().await?;
        let mut builder = query.build();
        let mut todos = builder
            .build_query_as::<Todo>()
            .fetch_all(&mut *session)
            .await?;
        todos.retain(|todo| query.matches_search(&todo.title));
        debug!(count = todos.len(), "Listed todos");
        Ok(todos)
    }

    #[instrument(skip(self, todo))]
    async fn update(&self, id: i64, todo: NewTodo) -> Result<Option<Todo>, StorageError> {
        let mut tx = self.db.begin().await?;
        let updated = sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todo SET title = ?, completed = ?, priority = ?, due_date = ?, category = ? \
             WHERE id = ?{RETURNING}"
        ))
        .bind(todo.title)
        .bind(todo.completed)
        .bind(todo.priority.get())
        .bind(todo.due_date)
        .bind(todo.category)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<Option<Todo>, StorageError> {
        let mut tx = self.db.begin().await?;
        let deleted = sqlx::query_as::<_, Todo>(&format!("DELETE FROM todo WHERE id = ?{RETURNING}"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(deleted)
    }
}
