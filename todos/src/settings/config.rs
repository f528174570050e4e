use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use todos_core::settings::{
    api_server::ApiServer,
    auth::{AuthSettings, PaginationSettings},
    cache::CacheSettings,
    database::{sqlite_url_from_path, DatabaseSettings},
    rate_limiting::RateLimitingConfig,
    RunMode,
};

/// Secrets shipped in `config/default.yaml`, refused in release mode.
const DEVELOPMENT_SECRETS: [&str; 2] = [
    "development-jwt-secret-change-me",
    "development-cursor-secret-change-me",
];

#[derive(Debug, Deserialize, Clone)]
#[allow(unused)]
pub struct Settings {
    #[serde(default)]
    pub run_mode: RunMode,
    #[serde(default)]
    pub debug: bool,
    pub telemetry: Option<String>,
    #[serde(default)]
    pub api: ApiServer,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub pagination: PaginationSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,
    #[serde(default)]
    pub cache: CacheSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            run_mode: RunMode::default(),
            debug: false,
            telemetry: None,
            api: ApiServer::default(),
            auth: AuthSettings::default(),
            pagination: PaginationSettings::default(),
            database: DatabaseSettings::default(),
            rate_limiting: RateLimitingConfig::default(),
            cache: CacheSettings::default(),
        }
    }
}

impl Settings {
    pub fn get_environment() -> Environment {
        Environment::default()
            .prefix("TODOS")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    fn run_mode_from_env() -> Result<RunMode, ConfigError> {
        let raw = env::var("TODOS_RUN_MODE")
            .or_else(|_| env::var("GIN_MODE"))
            .unwrap_or_else(|_| "development".into());
        raw.parse().map_err(ConfigError::Message)
    }

    fn database_url_from_env() -> Option<String> {
        env::var("DATABASE_URL")
            .ok()
            .or_else(|| env::var("DATABASE_PATH").ok().map(|p| sqlite_url_from_path(&p)))
    }

    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = Self::run_mode_from_env()?;

        let builder = Config::builder()
            .set_default("api.bind_address", "0.0.0.0")?
            .set_default("api.port", 8080)?
            .set_default("database.url", "sqlite://todos.db?mode=rwc")?
            .set_default("database.migrations_path", "migrations")?
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode.as_str())).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Self::get_environment())
            // The plain variables documented for deployments win over everything else.
            .set_override("run_mode", run_mode.as_str())?
            .set_override_option("api.port", env::var("PORT").ok())?
            .set_override_option("api.enforce_https", env::var("ENFORCE_HTTPS").ok())?
            .set_override_option("auth.jwt_secret", env::var("JWT_SECRET").ok())?
            .set_override_option(
                "pagination.cursor_secret_key",
                env::var("CURSOR_SECRET_KEY").ok(),
            )?
            .set_override_option("database.url", Self::database_url_from_env())?
            .set_override_option("database.migrations_path", env::var("MIGRATIONS_PATH").ok())?;

        let s = builder.build()?;
        let mut settings: Settings = s.try_deserialize()?;

        // "no" / "false" / "0" disable telemetry even if the config file enables it.
        settings.telemetry = settings.check_if_optional(&settings.telemetry);
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Message(
                "auth.jwt_secret (JWT_SECRET) must be set".into(),
            ));
        }
        if self.pagination.cursor_secret_key.is_empty() {
            return Err(ConfigError::Message(
                "pagination.cursor_secret_key (CURSOR_SECRET_KEY) must be set".into(),
            ));
        }
        if self.run_mode == RunMode::Release {
            for secret in [&self.auth.jwt_secret, &self.pagination.cursor_secret_key] {
                if DEVELOPMENT_SECRETS.iter().any(|dev| secret == *dev) {
                    return Err(ConfigError::Message(
                        "development secrets must not be used in release mode".into(),
                    ));
                }
            }
        }
        if self.pagination.default_limit <= 0 || self.pagination.max_limit <= 0 {
            return Err(ConfigError::Message(
                "pagination limits must be greater than 0".into(),
            ));
        }
        if self.auth.token_lifetime.is_zero() {
            return Err(ConfigError::Message(
                "auth.token_lifetime must be greater than 0".into(),
            ));
        }
        self.rate_limiting
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(())
    }

    /// HTTPS redirects never apply to test runs.
    pub fn enforce_https(&self) -> bool {
        self.api.enforce_https && self.run_mode != RunMode::Test
    }

    fn check_if_optional(&self, s: &Option<String>) -> Option<String> {
        match s {
            None => None,
            Some(s) => match s.to_lowercase().as_str() {
                "no" | "false" | "0" | "" => None,
                _ => Some(s.to_string()),
            },
        }
    }
}
