use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::status::TodoStatus;

/// A persisted todo item.
///
/// `id` is the insertion-ordered row id and only used as a pagination
/// tiebreaker, clients address todos by `uuid`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct Todo {
    #[serde(skip_serializing)]
    pub id: i64,
    pub uuid: Uuid,
    pub title: String,
    pub description: String,
    pub status: TodoStatus,
    pub completed: bool,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Values for an insert. Timestamps are chosen by the caller so feeds can be
/// seeded deterministically.
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub uuid: Uuid,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub status: TodoStatus,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Validated partial update.
#[derive(Debug, Clone, Default)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TodoStatus>,
    pub completed: Option<bool>,
}

impl TodoChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.completed.is_none()
    }

    pub fn apply(self, todo: &mut Todo, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            todo.title = title;
        }
        if let Some(description) = self.description {
            todo.description = description;
        }
        if let Some(status) = self.status {
            todo.status = status;
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        todo.updated_at = now;
    }
}
