use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use todos_core::pagination::{CursorError, Page};
use todos_core::todos::Todo;
use todos_core::validation::FieldError;
use tracing::{debug, error};

use crate::db::StoreError;

#[derive(Clone, Error, Debug)]
pub enum AppError {
    #[error("Validation failed")]
    ValidationFailed(Vec<FieldError>),

    #[error("Bad request: {1}")]
    BadRequest(String, String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(CursorError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub code: &'static str,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// A rejected cursor still answers with the shape of an (empty) feed page.
#[derive(Debug, Serialize)]
pub struct InvalidCursorResponse {
    pub error: ErrorBody,
    #[serde(flatten)]
    pub page: Page<Todo>,
}

impl AppError {
    pub fn bad_request(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::BadRequest(field.into(), message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationFailed(_) => "VALIDATION_ERROR",
            AppError::BadRequest(..) | AppError::InvalidCursor(_) => "BAD_REQUEST",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InternalServerError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(..) => StatusCode::BAD_REQUEST,
            AppError::InvalidCursor(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn field_errors(&self) -> Vec<FieldError> {
        match self {
            AppError::ValidationFailed(errors) => errors.clone(),
            AppError::BadRequest(field, message) => vec![FieldError::new(field, message)],
            AppError::InvalidCursor(e) => vec![FieldError::new("cursor", e.to_string())],
            AppError::Unauthorized(message) => vec![FieldError::new("", message)],
            AppError::NotFound(message) => vec![FieldError::new("", message)],
            // Details stay in the logs.
            AppError::InternalServerError(_) => {
                vec![FieldError::new("", "internal server error")]
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        if let Some(app_error) = e.downcast_ref::<AppError>() {
            return app_error.clone();
        }
        AppError::InternalServerError(e.to_string())
    }
}

impl From<CursorError> for AppError {
    fn from(e: CursorError) -> Self {
        AppError::InvalidCursor(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(_) => AppError::ValidationFailed(vec![FieldError::new(
                "email",
                "is already registered",
            )]),
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request("body", rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::bad_request("query", rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::InternalServerError(details) => error!("Request failed: {}", details),
            // Client supplied values, not worth more than debug.
            AppError::InvalidCursor(e) => debug!("Rejected cursor: {}", e),
            other => debug!("Request rejected: {}", other),
        }

        let error = ErrorBody {
            code: self.code(),
            errors: self.field_errors(),
        };
        match &self {
            AppError::InvalidCursor(_) => (
                self.status(),
                Json(InvalidCursorResponse {
                    error,
                    page: Page::empty(),
                }),
            )
                .into_response(),
            _ => (self.status(), Json(ErrorResponse { error })).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_schema() {
        let (status, json) = body_of(AppError::ValidationFailed(vec![FieldError::new(
            "title",
            "too short",
        )]))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["errors"][0]["field"], "title");
        assert_eq!(json["error"]["errors"][0]["message"], "too short");
    }

    #[tokio::test]
    async fn test_cursor_errors_are_bad_requests() {
        let (status, json) = body_of(CursorError::InvalidSignature.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert_eq!(json["error"]["errors"][0]["field"], "cursor");
        assert_eq!(json["size"], 0);
        assert_eq!(json["data"], serde_json::json!([]));
        assert_eq!(json["pagination"]["has_next"], false);
        assert_eq!(json["pagination"]["next_cursor"], "");
    }

    #[tokio::test]
    async fn test_other_errors_carry_no_page() {
        let (_, json) = body_of(AppError::NotFound("todo".into())).await;

        assert!(json.get("data").is_none());
        assert!(json.get("pagination").is_none());
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let (status, json) =
            body_of(AppError::InternalServerError("disk on fire".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["code"], "INTERNAL_ERROR");
        assert!(!json.to_string().contains("disk on fire"));
    }

    #[tokio::test]
    async fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("todo".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("nope".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::bad_request("x", "y").code(), "BAD_REQUEST");
    }

    #[test]
    fn test_duplicate_store_error_is_validation_error() {
        let error: AppError = StoreError::Duplicate("user a@b.c".into()).into();
        assert_eq!(error.code(), "VALIDATION_ERROR");
    }
}
