pub mod error;
pub mod handlers;
pub mod middleware;
pub mod rate_limiting;
pub mod response_cache;
pub mod router;

#[cfg(test)]
pub mod test_utils;
