//! Reconciliation error types

use thiserror::Error;

/// Errors raised by the reconciliation engine and by resource adapters
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Unknown resource kind: {0}")]
    UnknownResourceKind(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid resource ID: {0}")]
    InvalidResourceId(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Whether the remote side reported the object as absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::ResourceNotFound(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CloudError::Cancelled(_))
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
