//! Per-route fixed-window rate limiting.
//!
//! Each request is counted against a bucket picked by method and route
//! template. Routes keyed by user fall back to the client address for
//! anonymous callers. Counters live in memory and are swept periodically.

pub mod extractors;
pub mod limiter;
pub mod middleware;


pub use limiter::{RateLimitDecision, RateLimiter};
