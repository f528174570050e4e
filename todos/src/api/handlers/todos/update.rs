use axum::{
    debug_handler,
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use todos_core::todos::{Todo, UpdateTodoRequest};
use uuid::Uuid;

use super::todo_uuid;
use crate::api::error::{AppError, ErrorResponse};
use crate::api::middleware::auth::CurrentUser;
use crate::app_state::SharedAppState;

#[utoipa::path(
    put,
    path = "/todo/{uuid}",
    params(("uuid" = Uuid, Path, description = "Todo to update")),
    request_body = UpdateTodoRequest,
    responses(
    (status = 200, body = Todo),
    (status = 400, body = ErrorResponse),
    (status = 401, description = "Access token is missing or invalid"),
    (status = 404, description = "No such todo"),
    (status = 429, description = "Rate limit exceeded"),
    ),
    security(
        ("bearerAuth" = [])
    )
)]
#[debug_handler]
pub async fn update_todo_handler(
    State(state): State<SharedAppState>,
    Extension(user): Extension<CurrentUser>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<Todo>, AppError> {
    let uuid = todo_uuid(path)?;
    let Json(req) = payload?;
    let todo = state.todos.update(user.user_id, uuid, req).await?;
    Ok(Json(todo))
}
