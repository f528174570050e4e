use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use todos_core::pagination::cursor::{format_timestamp, parse_timestamp};
use todos_core::todos::{NewTodo, Todo, TodoStatus};
use uuid::Uuid;

use super::StoreError;

/// Sort key of a feed row, pages continue strictly after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedPosition {
    pub created_at: DateTime<Utc>,
    pub id: i64,
}

#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn create(&self, todo: NewTodo) -> Result<Todo, StoreError>;

    /// Only live (not soft-deleted) todos owned by `user_id` are visible.
    async fn find(&self, user_id: i64, uuid: Uuid) -> Result<Option<Todo>, StoreError>;

    /// Persist the mutable fields of `todo`. `None` if it vanished meanwhile.
    async fn update(&self, todo: &Todo) -> Result<Option<Todo>, StoreError>;

    /// Returns false when no live todo matched.
    async fn soft_delete(
        &self,
        user_id: i64,
        uuid: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Up to `limit` live todos of `user_id` in `(created_at DESC, id DESC)`
    /// order, starting strictly after `after` when given.
    async fn list_page(
        &self,
        user_id: i64,
        limit: i64,
        after: Option<FeedPosition>,
    ) -> Result<Vec<Todo>, StoreError>;
}

const TODO_COLUMNS: &str =
    "id, uuid, title, description, status, completed, user_id, created_at, updated_at, deleted_at";

#[derive(Debug, sqlx::FromRow)]
struct TodoRow {
    id: i64,
    uuid: String,
    title: String,
    description: String,
    status: i64,
    completed: bool,
    user_id: i64,
    created_at: String,
    updated_at: String,
    deleted_at: Option<String>,
}

fn timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    parse_timestamp(value).map_err(|e| StoreError::Corrupt(format!("{column} '{value}': {e}")))
}

impl TryFrom<TodoRow> for Todo {
    type Error = StoreError;

    fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
        Ok(Todo {
            id: row.id,
            uuid: Uuid::parse_str(&row.uuid)
                .map_err(|e| StoreError::Corrupt(format!("uuid '{}': {e}", row.uuid)))?,
            title: row.title,
            description: row.description,
            status: TodoStatus::try_from(row.status)
                .map_err(|e| StoreError::Corrupt(e.to_string()))?,
            completed: row.completed,
            user_id: row.user_id,
            created_at: timestamp("created_at", &row.created_at)?,
            updated_at: timestamp("updated_at", &row.updated_at)?,
            deleted_at: row
                .deleted_at
                .as_deref()
                .map(|v| timestamp("deleted_at", v))
                .transpose()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SqliteTodoRepository {
    pool: SqlitePool,
}

impl SqliteTodoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn create(&self, todo: NewTodo) -> Result<Todo, StoreError> {
        let created_at = format_timestamp(&todo.created_at);
        let sql = format!(
            "INSERT INTO todos (uuid, title, description, status, completed, user_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {TODO_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TodoRow>(&sql)
            .bind(todo.uuid.to_string())
            .bind(&todo.title)
            .bind(&todo.description)
            .bind(todo.status.as_i64())
            .bind(todo.completed)
            .bind(todo.user_id)
            .bind(&created_at)
            .bind(&created_at)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn find(&self, user_id: i64, uuid: Uuid) -> Result<Option<Todo>, StoreError> {
        let sql = format!(
            "SELECT {TODO_COLUMNS} FROM todos \
             WHERE uuid = ? AND user_id = ? AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, TodoRow>(&sql)
            .bind(uuid.to_string())
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Todo::try_from)
            .transpose()
    }

    async fn update(&self, todo: &Todo) -> Result<Option<Todo>, StoreError> {
        let sql = format!(
            "UPDATE todos SET title = ?, description = ?, status = ?, completed = ?, updated_at = ? \
             WHERE id = ? AND user_id = ? AND deleted_at IS NULL RETURNING {TODO_COLUMNS}"
        );
        sqlx::query_as::<_, TodoRow>(&sql)
            .bind(&todo.title)
            .bind(&todo.description)
            .bind(todo.status.as_i64())
            .bind(todo.completed)
            .bind(format_timestamp(&todo.updated_at))
            .bind(todo.id)
            .bind(todo.user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Todo::try_from)
            .transpose()
    }

    async fn soft_delete(
        &self,
        user_id: i64,
        uuid: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let at = format_timestamp(&at);
        let result = sqlx::query(
            "UPDATE todos SET deleted_at = ?, updated_at = ? \
             WHERE uuid = ? AND user_id = ? AND deleted_at IS NULL",
        )
        .bind(&at)
        .bind(&at)
        .bind(uuid.to_string())
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_page(
        &self,
        user_id: i64,
        limit: i64,
        after: Option<FeedPosition>,
    ) -> Result<Vec<Todo>, StoreError> {
        let rows = match after {
            None => {
                let sql = format!(
                    "SELECT {TODO_COLUMNS} FROM todos \
                     WHERE user_id = ? AND deleted_at IS NULL \
                     ORDER BY created_at DESC, id DESC LIMIT ?"
                );
                sqlx::query_as::<_, TodoRow>(&sql)
                    .bind(user_id)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            Some(position) => {
                // Strictly less than the composite key (created_at, id).
                let boundary = format_timestamp(&position.created_at);
                let sql = format!(
                    "SELECT {TODO_COLUMNS} FROM todos \
                     WHERE user_id = ? AND deleted_at IS NULL \
                     AND (created_at < ? OR (created_at = ? AND id < ?)) \
                     ORDER BY created_at DESC, id DESC LIMIT ?"
                );
                sqlx::query_as::<_, TodoRow>(&sql)
                    .bind(user_id)
                    .bind(&boundary)
                    .bind(&boundary)
                    .bind(position.id)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(Todo::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_utils::create_test_pool;
    use chrono::TimeZone;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn new_todo(user_id: i64, title: &str, created_at: DateTime<Utc>) -> NewTodo {
        NewTodo {
            uuid: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            description: String::new(),
            status: TodoStatus::Pending,
            completed: false,
            created_at,
        }
    }

    async fn repo() -> SqliteTodoRepository {
        SqliteTodoRepository::new(create_test_pool().await)
    }

    fn titles(todos: &[Todo]) -> Vec<&str> {
        todos.iter().map(|t| t.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let repo = repo().await;
        let a = repo.create(new_todo(1, "first", base())).await.unwrap();
        let b = repo.create(new_todo(1, "second", base())).await.unwrap();

        assert!(b.id > a.id);
        assert_eq!(a.created_at, base());
        assert_eq!(a.updated_at, base());
        assert!(a.deleted_at.is_none());
    }

    #[tokio::test]
    async fn test_list_orders_by_created_at_then_id_desc() {
        let repo = repo().await;
        repo.create(new_todo(1, "old", base())).await.unwrap();
        repo.create(new_todo(1, "tie-a", base() + chrono::Duration::minutes(1)))
            .await
            .unwrap();
        repo.create(new_todo(1, "tie-b", base() + chrono::Duration::minutes(1)))
            .await
            .unwrap();
        repo.create(new_todo(2, "someone else", base())).await.unwrap();

        let page = repo.list_page(1, 10, None).await.unwrap();
        assert_eq!(titles(&page), vec!["tie-b", "tie-a", "old"]);
    }

    #[tokio::test]
    async fn test_keyset_breaks_timestamp_ties_by_id() {
        let repo = repo().await;
        let same = base();
        for title in ["a", "b", "c", "d"] {
            repo.create(new_todo(1, title, same)).await.unwrap();
        }

        let first = repo.list_page(1, 2, None).await.unwrap();
        assert_eq!(titles(&first), vec!["d", "c"]);

        let last = first.last().unwrap();
        let rest = repo
            .list_page(
                1,
                10,
                Some(FeedPosition {
                    created_at: last.created_at,
                    id: last.id,
                }),
            )
            .await
            .unwrap();
        assert_eq!(titles(&rest), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_soft_deleted_rows_are_invisible() {
        let repo = repo().await;
        let todo = repo.create(new_todo(1, "gone soon", base())).await.unwrap();

        assert!(repo.soft_delete(1, todo.uuid, base()).await.unwrap());
        assert!(!repo.soft_delete(1, todo.uuid, base()).await.unwrap());
        assert!(repo.find(1, todo.uuid).await.unwrap().is_none());
        assert!(repo.list_page(1, 10, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_and_update_respect_ownership() {
        let repo = repo().await;
        let mut todo = repo.create(new_todo(1, "mine", base())).await.unwrap();

        assert!(repo.find(2, todo.uuid).await.unwrap().is_none());
        assert!(!repo.soft_delete(2, todo.uuid, base()).await.unwrap());

        todo.title = "still mine".to_string();
        todo.status = TodoStatus::Completed;
        todo.updated_at = base() + chrono::Duration::hours(1);
        let updated = repo.update(&todo).await.unwrap().unwrap();
        assert_eq!(updated.title, "still mine");
        assert_eq!(updated.status, TodoStatus::Completed);
        assert_eq!(updated.created_at, base());
        assert_eq!(updated.updated_at, base() + chrono::Duration::hours(1));

        todo.user_id = 2;
        assert!(repo.update(&todo).await.unwrap().is_none());
    }
}
