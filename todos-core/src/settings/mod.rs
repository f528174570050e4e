pub mod api_server;
pub mod auth;
pub mod cache;
pub mod database;
pub mod interval;
pub mod rate_limiting;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Development,
    Test,
    Release,
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "debug" | "" => Ok(RunMode::Development),
            "test" => Ok(RunMode::Test),
            "release" | "production" => Ok(RunMode::Release),
            other => Err(format!("unknown run mode '{other}'")),
        }
    }
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Development => "development",
            RunMode::Test => "test",
            RunMode::Release => "release",
        }
    }
}
