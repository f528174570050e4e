pub mod create;
pub mod delete;
pub mod list;
pub mod update;

use axum::extract::{rejection::PathRejection, Path};
use uuid::Uuid;

use crate::api::error::AppError;

/// A path segment that is not a uuid cannot name an existing todo.
fn todo_uuid(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(uuid)| uuid)
        .map_err(|_| AppError::NotFound("todo not found".to_string()))
}
