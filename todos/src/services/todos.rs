use chrono::Utc;
use std::sync::Arc;
use todos_core::pagination::{CursorCodec, Page};
use todos_core::settings::auth::PaginationSettings;
use todos_core::todos::{CreateTodoRequest, NewTodo, Todo, UpdateTodoRequest};
use todos_core::validation::{validate_create, validate_update};
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::error::AppError;
use crate::db::todos::{FeedPosition, TodoRepository};

/// Todo CRUD scoped to a single owner, plus the cursor-paginated feed.
#[derive(Clone)]
pub struct TodoService {
    repo: Arc<dyn TodoRepository>,
    cursors: CursorCodec,
    pagination: PaginationSettings,
}

impl TodoService {
    pub fn new(
        repo: Arc<dyn TodoRepository>,
        cursors: CursorCodec,
        pagination: PaginationSettings,
    ) -> Self {
        Self {
            repo,
            cursors,
            pagination,
        }
    }

    /// One page of the owner's feed, newest first.
    ///
    /// An empty cursor starts from the top. Invalid cursors are rejected
    /// before the store is touched.
    pub async fn list(
        &self,
        user_id: i64,
        limit: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<Page<Todo>, AppError> {
        let limit = self.pagination.effective_limit(limit);

        let after = match cursor.filter(|c| !c.is_empty()) {
            Some(token) => {
                let position = self.cursors.decode(token)?;
                Some(FeedPosition {
                    created_at: position.timestamp()?,
                    id: position.id,
                })
            }
            None => None,
        };

        // Probe one extra row to learn whether another page exists.
        let rows = self.repo.list_page(user_id, limit + 1, after).await?;
        debug!(user_id, limit, rows = rows.len(), "Fetched feed page");

        Ok(Page::from_probe(rows, limit as usize, |last| {
            self.cursors.encode_position(&last.created_at, last.id)
        }))
    }

    pub async fn create(&self, user_id: i64, req: CreateTodoRequest) -> Result<Todo, AppError> {
        let valid = validate_create(req).map_err(AppError::ValidationFailed)?;
        let todo = self
            .repo
            .create(NewTodo {
                uuid: Uuid::new_v4(),
                user_id,
                title: valid.title,
                description: valid.description,
                status: valid.status,
                completed: valid.completed,
                created_at: Utc::now(),
            })
            .await?;

        info!(user_id, "Created todo {}", todo.uuid);
        Ok(todo)
    }

    pub async fn update(
        &self,
        user_id: i64,
        uuid: Uuid,
        req: UpdateTodoRequest,
    ) -> Result<Todo, AppError> {
        let changes = validate_update(req).map_err(AppError::ValidationFailed)?;
        let mut todo = self
            .repo
            .find(user_id, uuid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("todo {uuid}")))?;

        if changes.is_empty() {
            return Ok(todo);
        }

        changes.apply(&mut todo, Utc::now());
        self.repo
            .update(&todo)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("todo {uuid}")))
    }

    pub async fn delete(&self, user_id: i64, uuid: Uuid) -> Result<(), AppError> {
        if self.repo.soft_delete(user_id, uuid, Utc::now()).await? {
            info!(user_id, "Deleted todo {}", uuid);
            Ok(())
        } else {
            Err(AppError::NotFound(format!("todo {uuid}")))
        }
    }
}
