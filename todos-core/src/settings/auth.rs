use serde::Deserialize;

use super::interval::Interval;
use crate::utils::secret::Secret;

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    /// HS256 signing key for session tokens.
    pub jwt_secret: Secret,
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime: Interval,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_token_lifetime() -> Interval {
    Interval::Hours(3)
}

fn default_bcrypt_cost() -> u32 {
    12
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: Secret::default(),
            token_lifetime: default_token_lifetime(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaginationSettings {
    /// HMAC key for pagination cursors. Changing it invalidates all cursors.
    pub cursor_secret_key: Secret,
    #[serde(default = "default_limit")]
    pub default_limit: i64,
    #[serde(default = "default_max_limit")]
    pub max_limit: i64,
}

fn default_limit() -> i64 {
    10
}

fn default_max_limit() -> i64 {
    100
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            cursor_secret_key: Secret::default(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl PaginationSettings {
    /// Non-positive limits fall back to the default, large ones are capped.
    pub fn effective_limit(&self, requested: Option<i64>) -> i64 {
        match requested {
            Some(limit) if limit > 0 => limit.min(self.max_limit),
            _ => self.default_limit,
        }
    }
}
