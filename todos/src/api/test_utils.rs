//! Shared helpers for the unit and router tests.

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use config::Config;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use todos_core::pagination::CursorCodec;
use todos_core::todos::{NewTodo, Todo};
use uuid::Uuid;

use crate::api::router::ApiRoutes;
use crate::app_state::{AppState, SharedAppState};
use crate::db::todos::{FeedPosition, SqliteTodoRepository, TodoRepository};
use crate::db::users::SqliteUserRepository;
use crate::db::{self, StoreError};
use crate::services::{TodoService, TokenService, UserService};
use crate::settings::config::Settings;
use crate::stop_flag::StopFlag;

/// A private in-memory database with the schema applied.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    db::run_migrations(&pool, concat!(env!("CARGO_MANIFEST_DIR"), "/migrations"))
        .await
        .expect("migrations apply");
    pool
}

pub fn create_test_settings() -> Settings {
    create_test_settings_with(&[])
}

/// Test settings with `key = value` overrides applied on top.
pub fn create_test_settings_with(overrides: &[(&str, &str)]) -> Settings {
    let mut builder =
        Config::builder().add_source(config::File::with_name("tests/test_config"));
    for (key, value) in overrides {
        builder = builder.set_override(*key, *value).unwrap();
    }
    builder.build().unwrap().try_deserialize().unwrap()
}

/// Counts how often the feed is read, wrapping a real repository.
pub struct CountingTodoRepository {
    inner: SqliteTodoRepository,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
}

impl CountingTodoRepository {
    pub fn new(inner: SqliteTodoRepository) -> Self {
        Self {
            inner,
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TodoRepository for CountingTodoRepository {
    async fn create(&self, todo: NewTodo) -> Result<Todo, StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create(todo).await
    }

    async fn find(&self, user_id: i64, uuid: Uuid) -> Result<Option<Todo>, StoreError> {
        self.inner.find(user_id, uuid).await
    }

    async fn update(&self, todo: &Todo) -> Result<Option<Todo>, StoreError> {
        self.inner.update(todo).await
    }

    async fn soft_delete(
        &self,
        user_id: i64,
        uuid: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.inner.soft_delete(user_id, uuid, at).await
    }

    async fn list_page(
        &self,
        user_id: i64,
        limit: i64,
        after: Option<FeedPosition>,
    ) -> Result<Vec<Todo>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_page(user_id, limit, after).await
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: SharedAppState,
    pub todos: Arc<CountingTodoRepository>,
}

impl TestApp {
    pub fn bearer(&self, user_id: i64) -> String {
        let token = self
            .state
            .users
            .tokens()
            .issue(user_id)
            .expect("token is issued");
        format!("Bearer {token}")
    }
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with_settings(create_test_settings()).await
}

pub async fn create_test_app_with_settings(settings: Settings) -> TestApp {
    let pool = create_test_pool().await;
    let todos = Arc::new(CountingTodoRepository::new(SqliteTodoRepository::new(
        pool.clone(),
    )));

    let todo_service = TodoService::new(
        todos.clone(),
        CursorCodec::new(settings.pagination.cursor_secret_key.expose_secret()),
        settings.pagination.clone(),
    );
    let user_service = UserService::new(
        Arc::new(SqliteUserRepository::new(pool)),
        TokenService::new(
            settings.auth.jwt_secret.expose_secret(),
            settings.auth.token_lifetime.as_duration(),
        ),
        settings.auth.bcrypt_cost,
    );

    let state = AppState::from_services(settings, todo_service, user_service, StopFlag::new());
    let server = TestServer::new(ApiRoutes::create(state.clone())).unwrap();

    TestApp {
        server,
        state,
        todos,
    }
}
