use axum::extract::ConnectInfo;
use axum::http::Request;
use std::net::SocketAddr;

use todos_core::settings::rate_limiting::KeyStrategy;

use crate::api::middleware::identity::RequestIdentity;

/// Collection prefixes whose second segment is a todo uuid.
const UUID_ROUTES: [&str; 2] = ["todo", "todos"];

/// Map a concrete request path onto its route template.
///
/// `/todo/<anything>` and `/todos/<anything>` become `/todo/:uuid` and
/// `/todos/:uuid`. Every other path is its own template.
pub fn route_template(path: &str) -> String {
    let mut segments = path.trim_start_matches('/').splitn(3, '/');
    let first = segments.next().unwrap_or_default();
    let second = segments.next();
    let rest = segments.next();

    match (second, rest) {
        (Some(id), None) if !id.is_empty() && UUID_ROUTES.contains(&first) => {
            format!("/{first}/:uuid")
        }
        _ => path.to_string(),
    }
}

/// Best effort client address.
///
/// The first `X-Forwarded-For` entry wins, then `X-Real-IP`, then the peer
/// address of the connection.
pub fn client_ip<T>(req: &Request<T>) -> String {
    let headers = req.headers();

    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return forwarded.to_string();
    }

    if let Some(real_ip) = headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return real_ip.to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// The identity part of a rate limit key.
pub fn limiter_identity(identity: &RequestIdentity, strategy: KeyStrategy) -> String {
    match (strategy, identity.user_id) {
        (KeyStrategy::UserId, Some(user_id)) => format!("user_{user_id}"),
        _ => identity.client_ip.clone(),
    }
}
