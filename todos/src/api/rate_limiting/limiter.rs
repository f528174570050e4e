use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use todos_core::settings::interval::Interval;
use todos_core::settings::rate_limiting::{BucketConfig, RateLimitingConfig};

/// Counter for one `(route, identity)` key within its current window.
#[derive(Debug, Clone)]
struct RateLimitEntry {
    count: u32,
    reset_time: Instant,
    reset_at: SystemTime,
}

/// Outcome of a single admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub window: Interval,
    reset_time: Instant,
    reset_at: SystemTime,
}

impl RateLimitDecision {
    /// Unix timestamp (seconds) at which the window resets.
    pub fn reset_unix(&self) -> u64 {
        self.reset_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }

    /// Whole seconds until the window resets, never more than the window.
    pub fn retry_after_secs(&self, now: Instant) -> u64 {
        let left = self.reset_time.saturating_duration_since(now);
        let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
        secs.min(self.window.as_duration().as_secs().max(1))
    }
}

/// Fixed-window request counter shared by every request of the process.
///
/// The n-th admitted request of a window observes `remaining = limit - n`.
/// Denied requests do not touch the counter.
#[derive(Debug)]
pub struct RateLimiter {
    enabled: bool,
    default: BucketConfig,
    routes: HashMap<String, BucketConfig>,
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitingConfig) -> Self {
        let routes = config
            .routes
            .iter()
            .map(|r| (r.route.clone(), r.bucket()))
            .collect();

        Self {
            enabled: config.enabled,
            default: config.default.clone(),
            routes,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Bucket for a request: `"<METHOD> <template>"` first, then the bare
    /// template, then the default bucket.
    pub fn bucket_for(&self, method: &str, template: &str) -> &BucketConfig {
        self.routes
            .get(&format!("{method} {template}"))
            .or_else(|| self.routes.get(template))
            .unwrap_or(&self.default)
    }

    pub fn check(&self, key: &str, bucket: &BucketConfig) -> RateLimitDecision {
        self.check_at(key, bucket, Instant::now(), SystemTime::now())
    }

    fn check_at(
        &self,
        key: &str,
        bucket: &BucketConfig,
        now: Instant,
        wall_now: SystemTime,
    ) -> RateLimitDecision {
        let window = bucket.window.as_duration();

        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(_) => {
                warn!("Rate limiter state is poisoned, admitting request for {}", key);
                return RateLimitDecision {
                    allowed: true,
                    limit: bucket.limit,
                    remaining: bucket.limit.saturating_sub(1),
                    window: bucket.window,
                    reset_time: now + window,
                    reset_at: wall_now + window,
                };
            }
        };

        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                reset_time: now + window,
                reset_at: wall_now + window,
            });

        if now >= entry.reset_time {
            entry.count = 0;
            entry.reset_time = now + window;
            entry.reset_at = wall_now + window;
        }

        let allowed = entry.count < bucket.limit;
        if allowed {
            entry.count += 1;
        }

        RateLimitDecision {
            allowed,
            limit: bucket.limit,
            remaining: bucket.limit.saturating_sub(entry.count),
            window: bucket.window,
            reset_time: entry.reset_time,
            reset_at: entry.reset_at,
        }
    }

    /// Drop counters whose window has ended. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            warn!("Rate limiter state is poisoned, skipping sweep");
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, entry| entry.reset_time > now);
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Swept {} expired rate limit counters", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
