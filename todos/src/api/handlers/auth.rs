use axum::{
    debug_handler,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::error::{AppError, ErrorResponse};
use crate::app_state::SharedAppState;
use crate::db::users::UserView;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    pub refresh_token: String,
}

#[utoipa::path(
    post,
    path = "/signup",
    request_body = Credentials,
    responses(
    (status = 201, body = UserView),
    (status = 400, body = ErrorResponse),
    (status = 429, description = "Rate limit exceeded"),
    )
)]
#[debug_handler]
pub async fn signup_handler(
    State(state): State<SharedAppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    let Json(credentials) = payload?;
    let user = state
        .users
        .signup(&credentials.email, &credentials.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    post,
    path = "/auth",
    request_body = Credentials,
    responses(
    (status = 200, body = TokenResponse),
    (status = 401, description = "Invalid email or password"),
    (status = 429, description = "Rate limit exceeded"),
    )
)]
#[debug_handler]
pub async fn login_handler(
    State(state): State<SharedAppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(credentials) = payload?;
    let refresh_token = state
        .users
        .login(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(TokenResponse { refresh_token }))
}
