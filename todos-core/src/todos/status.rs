use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Workflow state of a todo. The discriminant is the value stored in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    #[default]
    Pending = 0,
    InProgress = 1,
    InReview = 2,
    Completed = 3,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid status '{0}', expected one of pending, in_progress, in_review, completed")]
pub struct InvalidStatus(pub String);

impl TodoStatus {
    pub const ALL: [TodoStatus; 4] = [
        TodoStatus::Pending,
        TodoStatus::InProgress,
        TodoStatus::InReview,
        TodoStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::InProgress => "in_progress",
            TodoStatus::InReview => "in_review",
            TodoStatus::Completed => "completed",
        }
    }

    pub fn as_i64(&self) -> i64 {
        *self as i64
    }
}

/// The single status parser: an empty string means `pending`, anything
/// unknown is an error.
impl FromStr for TodoStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "pending" => Ok(TodoStatus::Pending),
            "in_progress" => Ok(TodoStatus::InProgress),
            "in_review" => Ok(TodoStatus::InReview),
            "completed" => Ok(TodoStatus::Completed),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

impl TryFrom<i64> for TodoStatus {
    type Error = InvalidStatus;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        TodoStatus::ALL
            .into_iter()
            .find(|status| status.as_i64() == value)
            .ok_or_else(|| InvalidStatus(value.to_string()))
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
