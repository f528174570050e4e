use axum::{
    debug_handler,
    extract::{rejection::PathRejection, Path, State},
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use super::todo_uuid;
use crate::api::error::AppError;
use crate::api::middleware::auth::CurrentUser;
use crate::app_state::SharedAppState;

#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteResponse {
    pub message: String,
}

#[utoipa::path(
    delete,
    path = "/todos/{uuid}",
    params(("uuid" = Uuid, Path, description = "Todo to delete")),
    responses(
    (status = 200, body = DeleteResponse),
    (status = 401, description = "Access token is missing or invalid"),
    (status = 404, description = "No such todo"),
    (status = 429, description = "Rate limit exceeded"),
    ),
    security(
        ("bearerAuth" = [])
    )
)]
#[debug_handler]
pub async fn delete_todo_handler(
    State(state): State<SharedAppState>,
    Extension(user): Extension<CurrentUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DeleteResponse>, AppError> {
    let uuid = todo_uuid(path)?;
    state.todos.delete(user.user_id, uuid).await?;
    Ok(Json(DeleteResponse {
        message: "Todo deleted successfully".to_string(),
    }))
}
