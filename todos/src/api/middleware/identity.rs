use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::api::rate_limiting::extractors::client_ip;
use crate::app_state::SharedAppState;

/// Who is calling, as far as the cache and the limiter care.
///
/// Resolved once per request. An invalid or missing token leaves `user_id`
/// empty, rejecting the request is left to the auth layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestIdentity {
    pub user_id: Option<i64>,
    pub client_ip: String,
}

impl RequestIdentity {
    /// The identity stored by [`resolve_identity`], or an anonymous one
    /// derived from the request itself.
    pub fn of<T>(req: &Request<T>) -> Self {
        req.extensions()
            .get::<RequestIdentity>()
            .cloned()
            .unwrap_or_else(|| RequestIdentity {
                user_id: None,
                client_ip: client_ip(req),
            })
    }

    /// `user_<id>` for authenticated callers, `ip_<addr>` otherwise.
    pub fn cache_identity(&self) -> String {
        match self.user_id {
            Some(user_id) => format!("user_{user_id}"),
            None => format!("ip_{}", self.client_ip),
        }
    }
}

pub fn bearer_token<T>(req: &Request<T>) -> Option<&str> {
    req.headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn resolve_identity(
    State(state): State<SharedAppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let user_id = bearer_token(&req)
        .and_then(|token| state.users.tokens().verify(token))
        .map(|claims| claims.user_id);

    let identity = RequestIdentity {
        user_id,
        client_ip: client_ip(&req),
    };
    req.extensions_mut().insert(identity);
    next.run(req).await
}
