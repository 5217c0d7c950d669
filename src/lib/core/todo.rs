use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::error::TodoError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A stored todo row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub completed: bool,
    pub priority: i64,
    pub due_date: Option<NaiveDate>,
    pub category: Option<String>,
}

/// Priority on the 1..=10 scale. Out-of-range values are rejected, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(u8);

impl Priority {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 10;
    pub const DEFAULT: Priority = Priority(5);

    pub fn get(self) -> i64 {
        i64::from(self.0)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for Priority {
    type Error = TodoError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Priority(value as u8))
        } else {
            Err(TodoError::Validation(format!(
                "Priority must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }
}

/// Request body for create and update. Every mutable field is carried, so an
/// update always replaces the whole row. An `id` in the body is an unknown
/// field and is dropped by serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoPayload {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

fn default_priority() -> i64 {
    Priority::DEFAULT.get()
}

impl TodoPayload {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: false,
            priority: default_priority(),
            due_date: None,
            category: None,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    /// Checks the payload and normalizes it into a writable record.
    pub fn validate(self) -> Result<NewTodo, TodoError> {
        let priority = Priority::try_from(self.priority)?;
        let due_date = match self.due_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_due_date(raw)?),
        };
        Ok(NewTodo {
            title: self.title,
            completed: self.completed,
            priority,
            due_date,
            category: self.category,
        })
    }
}

pub fn parse_due_date(raw: &str) -> Result<NaiveDate, TodoError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
        TodoError::Validation(format!(
            "Invalid date format: {raw}. Expected YYYY-MM-DD"
        ))
    })
}

/// A validated record ready to be written. Holds no id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub completed: bool,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub category: Option<String>,
}
