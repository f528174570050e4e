//! Input validation shared by the HTTP layer and services.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::todos::{CreateTodoRequest, TodoChanges, TodoStatus, UpdateTodoRequest};

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 255;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
pub const EMAIL_MAX_CHARS: usize = 254;
pub const PASSWORD_MIN_BYTES: usize = 8;
/// bcrypt ignores everything past 72 bytes.
pub const PASSWORD_MAX_BYTES: usize = 72;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validated create payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidTodo {
    pub title: String,
    pub description: String,
    pub status: TodoStatus,
    pub completed: bool,
}

fn check_title(title: &str, errors: &mut Vec<FieldError>) {
    let len = title.trim().chars().count();
    if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&len) {
        errors.push(FieldError::new(
            "title",
            format!("must be between {TITLE_MIN_CHARS} and {TITLE_MAX_CHARS} characters"),
        ));
    }
}

fn check_description(description: &str, errors: &mut Vec<FieldError>) {
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        errors.push(FieldError::new(
            "description",
            format!("must be at most {DESCRIPTION_MAX_CHARS} characters"),
        ));
    }
}

fn check_status(status: &str, errors: &mut Vec<FieldError>) -> Option<TodoStatus> {
    match status.parse::<TodoStatus>() {
        Ok(status) => Some(status),
        Err(e) => {
            errors.push(FieldError::new("status", e.to_string()));
            None
        }
    }
}

pub fn validate_create(req: CreateTodoRequest) -> Result<ValidTodo, Vec<FieldError>> {
    let mut errors = Vec::new();
    check_title(&req.title, &mut errors);
    check_description(&req.description, &mut errors);
    let status = check_status(&req.status, &mut errors);

    match status {
        Some(status) if errors.is_empty() => Ok(ValidTodo {
            title: req.title.trim().to_string(),
            description: req.description,
            status,
            completed: req.completed,
        }),
        _ => Err(errors),
    }
}

pub fn validate_update(req: UpdateTodoRequest) -> Result<TodoChanges, Vec<FieldError>> {
    let mut errors = Vec::new();
    if let Some(title) = &req.title {
        check_title(title, &mut errors);
    }
    if let Some(description) = &req.description {
        check_description(description, &mut errors);
    }
    let status = req
        .status
        .as_deref()
        .and_then(|s| check_status(s, &mut errors));

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(TodoChanges {
        title: req.title.map(|t| t.trim().to_string()),
        description: req.description,
        status,
        completed: req.completed,
    })
}

pub fn validate_credentials(email: &str, password: &str) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if email.chars().count() > EMAIL_MAX_CHARS || !EMAIL_RE.is_match(email) {
        errors.push(FieldError::new("email", "must be a valid email address"));
    }
    if !(PASSWORD_MIN_BYTES..=PASSWORD_MAX_BYTES).contains(&password.len()) {
        errors.push(FieldError::new(
            "password",
            format!("must be between {PASSWORD_MIN_BYTES} and {PASSWORD_MAX_BYTES} bytes"),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(title: &str, status: &str) -> CreateTodoRequest {
        CreateTodoRequest {
            title: title.to_string(),
            description: String::new(),
            status: status.to_string(),
            completed: false,
        }
    }

    #[test]
    fn test_create_defaults_status_to_pending() {
        let valid = validate_create(create("Buy milk", "")).unwrap();
        assert_eq!(valid.status, TodoStatus::Pending);
        assert_eq!(valid.title, "Buy milk");
    }

    #[test]
    fn test_create_rejects_short_title_and_bad_status() {
        let errors = validate_create(create("ab", "done")).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "status"]);
    }

    #[test]
    fn test_create_rejects_long_description() {
        let mut req = create("Valid title", "pending");
        req.description = "x".repeat(DESCRIPTION_MAX_CHARS + 1);
        let errors = validate_create(req).unwrap_err();
        assert_eq!(errors[0].field, "description");
    }

    #[test]
    fn test_title_limits_count_characters() {
        assert!(validate_create(create(&"é".repeat(TITLE_MAX_CHARS), "")).is_ok());
        assert!(validate_create(create(&"é".repeat(TITLE_MAX_CHARS + 1), "")).is_err());
    }

    #[test]
    fn test_update_only_validates_present_fields() {
        let changes = validate_update(UpdateTodoRequest {
            completed: Some(true),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.completed, Some(true));
        assert!(changes.title.is_none());

        let errors = validate_update(UpdateTodoRequest {
            status: Some("archived".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(errors[0].field, "status");
    }

    #[test]
    fn test_update_with_empty_status_resets_to_pending() {
        let changes = validate_update(UpdateTodoRequest {
            status: Some(String::new()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.status, Some(TodoStatus::Pending));
    }

    #[test]
    fn test_credentials() {
        assert!(validate_credentials("ada@example.com", "correct horse").is_ok());

        let errors = validate_credentials("not-an-email", "short").unwrap_err();
        assert_eq!(errors.len(), 2);

        let too_long = "x".repeat(PASSWORD_MAX_BYTES + 1);
        assert!(validate_credentials("ada@example.com", &too_long).is_err());
    }
}
