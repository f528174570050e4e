use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::app_state::SharedAppState;

/// Redirect plain HTTP requests to HTTPS when TLS is terminated upstream.
///
/// Anything but `X-Forwarded-Proto: https` is redirected, including requests
/// that carry no such header.
pub async fn redirect_to_https(
    State(state): State<SharedAppState>,
    req: Request,
    next: Next,
) -> Response {
    if !state.settings.enforce_https() {
        return next.run(req).await;
    }

    let forwarded_proto = req
        .headers()
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .map(|p| p.trim().to_ascii_lowercase());

    if forwarded_proto.as_deref() == Some("https") {
        return next.run(req).await;
    }

    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()));
    let Some(host) = host else {
        debug!("Cannot redirect request without a host");
        return next.run(req).await;
    };

    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let location = format!("https://{host}{path_and_query}");
    debug!("Redirecting to {}", location);

    (
        StatusCode::PERMANENT_REDIRECT,
        [(header::LOCATION, location)],
    )
        .into_response()
}
