use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use md5::{Digest, Md5};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use todos_core::settings::cache::CacheSettings;

use super::{X_CACHE, X_CACHE_AGE};

/// A captured 2xx response.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl CachedResponse {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }

    /// Replay the stored response, tagged as a hit.
    pub fn into_hit(self, now: Instant) -> Response {
        let age = now.saturating_duration_since(self.stored_at).as_secs();
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
            .headers_mut()
            .insert(X_CACHE, HeaderValue::from_static("HIT"));
        response
            .headers_mut()
            .insert(X_CACHE_AGE, HeaderValue::from(age));
        response
    }
}

/// In-memory response store keyed by route, query and caller.
#[derive(Debug)]
pub struct ResponseCache {
    enabled: bool,
    default_ttl: Duration,
    routes: HashMap<String, Duration>,
    entries: Mutex<HashMap<String, CachedResponse>>,
}

impl ResponseCache {
    pub fn new(settings: &CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            default_ttl: settings.default_ttl.as_duration(),
            routes: settings
                .routes
                .iter()
                .map(|r| (r.route.clone(), r.ttl.as_duration()))
                .collect(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ttl_for(&self, route: &str) -> Duration {
        self.routes.get(route).copied().unwrap_or(self.default_ttl)
    }

    /// `cache:<route>:<md5(route|query|identity)>`
    pub fn key(route: &str, raw_query: &str, identity: &str) -> String {
        let digest = Md5::digest(format!("{route}|{raw_query}|{identity}").as_bytes());
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        format!("cache:{route}:{hex}")
    }

    /// A fresh entry, expired ones are removed on the way.
    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<CachedResponse> {
        let Ok(mut entries) = self.entries.lock() else {
            warn!("Response cache is poisoned, bypassing lookup");
            return None;
        };
        match entries.get(key) {
            Some(entry) if entry.is_fresh(now) => Some(entry.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, entry: CachedResponse) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(key, entry);
            }
            Err(_) => warn!("Response cache is poisoned, dropping entry"),
        }
    }

    /// Evict entries past their TTL. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Swept {} expired cache entries", removed);
        }
        removed
    }

    pub fn flush(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
