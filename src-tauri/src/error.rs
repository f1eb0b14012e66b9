//! Error types shared by every QueryMind operation.
//!
//! Each failure carries a closed [`ErrorKind`] so the webview can branch on
//! the kind instead of parsing messages.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Machine-readable failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed input
    Validation,
    /// Simulated connection failure
    Connection,
    /// Sign-in, sign-up or credential store failure
    Auth,
    /// Unknown workspace or attempt
    NotFound,
    /// Overlapping operation on the same workspace
    Conflict,
    /// Operation cancelled by the user
    Cancelled,
    /// Persistence failure
    Storage,
    /// Unexpected state
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Connection => write!(f, "connection"),
            Self::Auth => write!(f, "auth"),
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Storage => write!(f, "storage"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Connection(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("a connection attempt is already in progress for workspace {0}")]
    ConnectionInProgress(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Auth(_) => ErrorKind::Auth,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::ConnectionInProgress(_) => ErrorKind::Conflict,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True when repeating the same action may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::ConnectionInProgress(_) | Self::Cancelled
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for AppError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Internal(err.to_string())
    }
}

// Commands hand errors to the webview as `{ kind, message }`.
impl Serialize for AppError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AppError", 2)?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_the_user_facing_taxonomy() {
        assert_eq!(AppError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(AppError::Connection("x".into()).kind(), ErrorKind::Connection);
        assert_eq!(AppError::Auth("x".into()).kind(), ErrorKind::Auth);
        assert_eq!(
            AppError::ConnectionInProgress("ws".into()).kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn retryable_errors() {
        assert!(AppError::Connection("Failed to connect".into()).is_retryable());
        assert!(AppError::Cancelled.is_retryable());
        assert!(!AppError::validation("Please enter a workspace name").is_retryable());
        assert!(!AppError::Auth("Invalid credentials".into()).is_retryable());
    }

    #[test]
    fn serializes_kind_and_message() {
        let value = serde_json::to_value(AppError::not_found("workspace 42")).unwrap();
        assert_eq!(value["kind"], "not_found");
        assert_eq!(value["message"], "workspace 42 not found");
    }
}
