//! Notification error types.

use prestamos_shared::{AppError, EmailError};
use thiserror::Error;

/// Notification errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Mail transport failed.
    #[error("mail transport error: {0}")]
    Mail(String),

    /// Alert repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl NotifyError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}

impl From<EmailError> for NotifyError {
    fn from(err: EmailError) -> Self {
        Self::Mail(err.to_string())
    }
}

impl From<NotifyError> for AppError {
    fn from(err: NotifyError) -> Self {
        match err {
            NotifyError::Mail(msg) => Self::ExternalService(msg),
            NotifyError::Repository(msg) => Self::Database(msg),
        }
    }
}
