use serde::Deserialize;

use super::interval::Interval;

/// TTL override for one route template, e.g. `/todos`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteTtl {
    pub route: String,
    pub ttl: Interval,
}

impl RouteTtl {
    pub fn new(route: &str, ttl: Interval) -> Self {
        Self {
            route: route.to_string(),
            ttl,
        }
    }
}

/// Response cache for successful GET requests.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_ttl")]
    pub default_ttl: Interval,
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteTtl>,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: Interval,
}

fn default_enabled() -> bool {
    true
}

fn default_ttl() -> Interval {
    Interval::Seconds(1)
}

fn default_routes() -> Vec<RouteTtl> {
    vec![RouteTtl::new("/todos", Interval::Seconds(3))]
}

fn default_sweep_interval() -> Interval {
    Interval::Seconds(30)
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            default_ttl: default_ttl(),
            routes: default_routes(),
            sweep_interval: default_sweep_interval(),
        }
    }
}
