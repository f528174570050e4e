use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, warn};

use super::store::{CachedResponse, ResponseCache};
use super::X_CACHE;
use crate::api::middleware::identity::RequestIdentity;
use crate::api::rate_limiting::extractors::route_template;
use crate::app_state::SharedAppState;

pub async fn response_cache(
    State(state): State<SharedAppState>,
    req: Request,
    next: Next,
) -> Response {
    let cache = &state.response_cache;
    if !cache.is_enabled() || req.method() != Method::GET {
        return next.run(req).await;
    }

    let route = route_template(req.uri().path());
    let identity = RequestIdentity::of(&req).cache_identity();
    let key = ResponseCache::key(&route, req.uri().query().unwrap_or_default(), &identity);

    if let Some(hit) = cache.get(&key) {
        debug!("Cache hit for {}", route);
        return hit.into_hit(Instant::now());
    }

    let response = next.run(req).await;
    if !response.status().is_success() {
        return with_miss(response);
    }

    let (parts, body) = response.into_parts();
    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            cache.insert(
                key,
                CachedResponse {
                    status: parts.status,
                    headers: parts.headers.clone(),
                    body: bytes.clone(),
                    stored_at: Instant::now(),
                    ttl: cache.ttl_for(&route),
                },
            );
            with_miss(Response::from_parts(parts, Body::from(bytes)))
        }
        Err(e) => {
            // The body is gone, pass on what is left without a cache header.
            warn!("Failed to capture response for {}: {}", route, e);
            Response::from_parts(parts, Body::empty())
        }
    }
}

fn with_miss(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(X_CACHE, HeaderValue::from_static("MISS"));
    response
}
