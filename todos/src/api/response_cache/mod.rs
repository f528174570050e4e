//! Short-lived cache for successful GET responses.
//!
//! Sits in front of the rate limiter, so a hit neither reaches the handler
//! nor spends any of the caller's budget. Entries are per caller and are not
//! invalidated on writes, they simply expire.

pub mod middleware;
pub mod store;


use axum::http::HeaderName;

pub use store::{CachedResponse, ResponseCache};

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");
pub const X_CACHE_AGE: HeaderName = HeaderName::from_static("x-cache-age");
