use std::sync::Arc;

use sqlx::SqlitePool;
use todos_core::pagination::CursorCodec;
use tracing::info;

use crate::api::rate_limiting::RateLimiter;
use crate::api::response_cache::ResponseCache;
use crate::db::{self, todos::SqliteTodoRepository, users::SqliteUserRepository};
use crate::services::{TodoService, TokenService, UserService};
use crate::settings::config::Settings;
use crate::stop_flag;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub stop_flag: stop_flag::StopFlag,
    pub todos: TodoService,
    pub users: UserService,
    pub rate_limiter: Arc<RateLimiter>,
    pub response_cache: Arc<ResponseCache>,
}

pub type SharedAppState = Arc<AppState>;

impl AppState {
    pub async fn new() -> anyhow::Result<SharedAppState> {
        let settings = Settings::new()?;

        let stop_flag = stop_flag::StopFlag::new();
        stop_flag::register_signal_handler(&stop_flag);

        let pool = db::connect(&settings.database).await?;
        db::run_migrations(&pool, &settings.database.migrations_path).await?;

        Ok(Self::from_pool(settings, pool, stop_flag))
    }

    /// Settings only, for the `config` subcommand.
    pub fn new_for_config_only() -> anyhow::Result<Settings> {
        Ok(Settings::new()?)
    }

    pub fn from_pool(
        settings: Settings,
        pool: SqlitePool,
        stop_flag: stop_flag::StopFlag,
    ) -> SharedAppState {
        let todos = TodoService::new(
            Arc::new(SqliteTodoRepository::new(pool.clone())),
            CursorCodec::new(settings.pagination.cursor_secret_key.expose_secret()),
            settings.pagination.clone(),
        );
        let users = UserService::new(
            Arc::new(SqliteUserRepository::new(pool)),
            TokenService::new(
                settings.auth.jwt_secret.expose_secret(),
                settings.auth.token_lifetime.as_duration(),
            ),
            settings.auth.bcrypt_cost,
        );

        Self::from_services(settings, todos, users, stop_flag)
    }

    pub fn from_services(
        settings: Settings,
        todos: TodoService,
        users: UserService,
        stop_flag: stop_flag::StopFlag,
    ) -> SharedAppState {
        let rate_limiter = Arc::new(RateLimiter::new(&settings.rate_limiting));
        let response_cache = Arc::new(ResponseCache::new(&settings.cache));
        info!(
            "Rate limiting {}, response cache {}",
            if rate_limiter.is_enabled() { "enabled" } else { "disabled" },
            if response_cache.is_enabled() { "enabled" } else { "disabled" },
        );

        Arc::new(AppState {
            settings,
            stop_flag,
            todos,
            users,
            rate_limiter,
            response_cache,
        })
    }
}
