use axum::{
    debug_handler,
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use todos_core::pagination::Page;
use todos_core::todos::Todo;

use crate::api::error::AppError;
use crate::api::middleware::auth::CurrentUser;
use crate::app_state::SharedAppState;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ListParams {
    /// Page size, defaults to 10 and is capped at 100.
    pub limit: Option<i64>,
    /// `next_cursor` of the previous page.
    pub cursor: Option<String>,
}

#[utoipa::path(
    get,
    path = "/todos",
    params(ListParams),
    responses(
    (status = 200, description = "One page of the caller's todos, newest first"),
    (status = 400, description = "Invalid cursor or query"),
    (status = 401, description = "Access token is missing or invalid"),
    (status = 429, description = "Rate limit exceeded"),
    ),
    security(
        ("bearerAuth" = [])
    )
)]
#[debug_handler]
pub async fn list_todos_handler(
    State(state): State<SharedAppState>,
    Extension(user): Extension<CurrentUser>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Page<Todo>>, AppError> {
    let Query(params) = params?;
    let page = state
        .todos
        .list(user.user_id, params.limit, params.cursor.as_deref())
        .await?;
    Ok(Json(page))
}
