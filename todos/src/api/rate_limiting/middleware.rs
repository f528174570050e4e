//! Admission middleware enforcing the per-route fixed windows.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Instant;
use tracing::info;

use super::extractors::{limiter_identity, route_template};
use super::limiter::RateLimitDecision;
use crate::api::middleware::identity::RequestIdentity;
use crate::app_state::SharedAppState;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RateLimitExceeded {
    pub error: String,
    pub message: String,
    pub retry_after: u64,
}

fn apply_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_unix()));
}

fn too_many_requests(decision: &RateLimitDecision) -> Response {
    let retry_after = decision.retry_after_secs(Instant::now());
    let body = RateLimitExceeded {
        error: "Rate limit exceeded".to_string(),
        message: format!(
            "Too many requests. Limit: {} per {}",
            decision.limit, decision.window
        ),
        retry_after,
    };

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let headers = response.headers_mut();
    apply_headers(headers, decision);
    headers.insert(
        axum::http::header::RETRY_AFTER,
        HeaderValue::from(retry_after),
    );
    response
}

pub async fn rate_limit(
    State(state): State<SharedAppState>,
    req: Request,
    next: Next,
) -> Response {
    let limiter = &state.rate_limiter;
    if !limiter.is_enabled() {
        return next.run(req).await;
    }

    let method = req.method().as_str().to_string();
    let template = route_template(req.uri().path());
    let bucket = limiter.bucket_for(&method, &template).clone();
    let identity = RequestIdentity::of(&req);
    let key = format!(
        "rate_limit:{method} {template}:{}",
        limiter_identity(&identity, bucket.key)
    );

    let decision = limiter.check(&key, &bucket);
    if !decision.allowed {
        info!(
            "Rate limit exceeded for {} {} ({} per {})",
            method, template, decision.limit, decision.window
        );
        return too_many_requests(&decision);
    }

    let mut response = next.run(req).await;
    apply_headers(response.headers_mut(), &decision);
    response
}
