use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{debug, warn};

use crate::api::error::AppError;
use crate::api::middleware::identity::RequestIdentity;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: i64,
}

/// Reject requests without a valid session token.
///
/// Relies on the identity resolved further out in the stack.
pub async fn require_user(mut req: Request, next: Next) -> Result<Response, AppError> {
    let identity = RequestIdentity::of(&req);

    match identity.user_id {
        Some(user_id) => {
            debug!("User authenticated: {}", user_id);
            req.extensions_mut().insert(CurrentUser { user_id });
            Ok(next.run(req).await)
        }
        None => {
            warn!(
                "Unauthenticated request | {} {} | client: {}",
                req.method(),
                req.uri().path(),
                identity.client_ip
            );
            Err(AppError::Unauthorized(
                "missing or invalid bearer token".to_string(),
            ))
        }
    }
}
