use axum::{
    debug_handler,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use todos_core::todos::{CreateTodoRequest, Todo};

use crate::api::error::{AppError, ErrorResponse};
use crate::api::middleware::auth::CurrentUser;
use crate::app_state::SharedAppState;

#[utoipa::path(
    post,
    path = "/todos",
    request_body = CreateTodoRequest,
    responses(
    (status = 201, body = Todo),
    (status = 400, body = ErrorResponse),
    (status = 401, description = "Access token is missing or invalid"),
    (status = 429, description = "Rate limit exceeded"),
    ),
    security(
        ("bearerAuth" = [])
    )
)]
#[debug_handler]
pub async fn create_todo_handler(
    State(state): State<SharedAppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let Json(req) = payload?;
    let todo = state.todos.create(user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}
