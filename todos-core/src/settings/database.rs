use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[allow(unused)]
#[readonly::make]
pub struct DatabaseSettings {
    /// sqlx connection string, e.g. `sqlite://todos.db?mode=rwc`.
    pub url: String,
    pub migrations_path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://todos.db?mode=rwc".to_string(),
            migrations_path: "migrations".to_string(),
            max_connections: default_max_connections(),
        }
    }
}

/// Connection string for a plain SQLite file path.
pub fn sqlite_url_from_path(path: &str) -> String {
    format!("sqlite://{path}?mode=rwc")
}
