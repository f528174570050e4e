#![allow(dead_code)]

use axum::http::HeaderValue;
use axum_test::TestServer;
use config::Config;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use todos::app_state::{AppState, SharedAppState};
use todos::http::build_app;
use todos::settings::config::Settings;
use todos::stop_flag::StopFlag;

pub struct TestApp {
    pub server: TestServer,
    pub state: SharedAppState,
    pub pool: SqlitePool,
}

impl TestApp {
    pub fn auth(&self, user_id: i64) -> HeaderValue {
        let token = self.state.users.tokens().issue(user_id).unwrap();
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
    }
}

pub fn test_settings() -> Settings {
    Config::builder()
        .add_source(config::File::with_name("tests/test_config"))
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap()
}

/// The complete HTTP stack on top of a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    todos::db::run_migrations(&pool, concat!(env!("CARGO_MANIFEST_DIR"), "/migrations"))
        .await
        .unwrap();

    let state = AppState::from_pool(test_settings(), pool.clone(), StopFlag::new());
    let server = TestServer::new(build_app(state.clone(), false)).unwrap();

    TestApp {
        server,
        state,
        pool,
    }
}
