//! Domain errors for the claw control center.

use thiserror::Error;
use uuid::Uuid;

/// Format a cycle path as a human-readable string: `A -> B -> C -> A`.
pub fn format_cycle_path(path: &[Uuid]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Domain-level errors that can occur in the control center.
///
/// "No matching agent" is deliberately absent: it is an
/// [`AssignmentOutcome`](crate::services::assignment::AssignmentOutcome),
/// not a failure.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
