use serde::Deserialize;
use std::collections::HashSet;

use super::interval::Interval;

/// Rate limiting configuration validation error
#[derive(Debug, thiserror::Error)]
#[error("Rate limiting configuration error: {message}")]
pub struct RateLimitingValidationError {
    pub message: String,
}

/// How the limiter derives the identity a request is counted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// First `X-Forwarded-For` entry, then `X-Real-IP`, then the peer address.
    #[default]
    ClientIp,
    /// `user_<id>` for authenticated requests, otherwise the client IP.
    UserId,
}

/// Limit for a single bucket: at most `limit` requests per `window` per key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BucketConfig {
    pub limit: u32,
    pub window: Interval,
    #[serde(default)]
    pub key: KeyStrategy,
}

impl BucketConfig {
    pub fn new(limit: u32, window: Interval, key: KeyStrategy) -> Self {
        Self { limit, window, key }
    }

    pub fn validate(&self) -> Result<(), RateLimitingValidationError> {
        if self.limit == 0 {
            return Err(RateLimitingValidationError {
                message: "limit must be greater than 0".to_string(),
            });
        }
        if self.window.is_zero() {
            return Err(RateLimitingValidationError {
                message: "window must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// A bucket bound to a route key.
///
/// `route` is either `"<METHOD> <template>"` (e.g. `"PUT /todo/:uuid"`) or a
/// bare template matching every method.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteBucket {
    pub route: String,
    pub limit: u32,
    pub window: Interval,
    #[serde(default)]
    pub key: KeyStrategy,
}

impl RouteBucket {
    pub fn new(route: &str, limit: u32, window: Interval, key: KeyStrategy) -> Self {
        Self {
            route: route.to_string(),
            limit,
            window,
            key,
        }
    }

    pub fn bucket(&self) -> BucketConfig {
        BucketConfig::new(self.limit, self.window, self.key)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitingConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// How often expired counters are swept from memory.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: Interval,

    /// Bucket for every route without its own entry, rate limited by IP.
    #[serde(default = "default_bucket")]
    pub default: BucketConfig,

    #[serde(default = "default_routes")]
    pub routes: Vec<RouteBucket>,
}

fn default_enabled() -> bool {
    true
}

fn default_sweep_interval() -> Interval {
    Interval::Minutes(1)
}

fn default_bucket() -> BucketConfig {
    BucketConfig::new(60, Interval::Minutes(1), KeyStrategy::ClientIp)
}

fn default_routes() -> Vec<RouteBucket> {
    use KeyStrategy::{ClientIp, UserId};
    let minute = Interval::Minutes(1);
    vec![
        RouteBucket::new("POST /signup", 5, minute, ClientIp),
        RouteBucket::new("POST /auth", 10, minute, ClientIp),
        RouteBucket::new("GET /todos", 100, minute, UserId),
        RouteBucket::new("POST /todos", 20, minute, UserId),
        RouteBucket::new("PUT /todo/:uuid", 10, minute, UserId),
        RouteBucket::new("DELETE /todos/:uuid", 5, minute, UserId),
    ]
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            sweep_interval: default_sweep_interval(),
            default: default_bucket(),
            routes: default_routes(),
        }
    }
}

impl RateLimitingConfig {
    /// Validate the rate limiting configuration
    pub fn validate(&self) -> Result<(), RateLimitingValidationError> {
        if !self.enabled {
            return Ok(());
        }

        self.default
            .validate()
            .map_err(|e| RateLimitingValidationError {
                message: format!("default: {}", e.message),
            })?;

        let mut seen = HashSet::new();
        for route in &self.routes {
            if !seen.insert(route.route.as_str()) {
                return Err(RateLimitingValidationError {
                    message: format!("duplicate route '{}'", route.route),
                });
            }
            route
                .bucket()
                .validate()
                .map_err(|e| RateLimitingValidationError {
                    message: format!("{}: {}", route.route, e.message),
                })?;
        }

        Ok(())
    }
}
