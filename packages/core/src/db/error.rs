//! Backend Error Types
//!
//! Raw failures reported by a [`DocumentBackend`](super::DocumentBackend) or
//! [`TreeBackend`](super::TreeBackend). These never leave the facades; the
//! service layer converts them into [`StoreError`](crate::services::StoreError).

use thiserror::Error;

/// Backend operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Location does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Security rules or credentials rejected the call
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Backend rejected the arguments of the call
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Backend could not be reached
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Anything else, including poisoned local state
    #[error("Internal backend error: {0}")]
    Internal(String),
}

impl BackendError {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a permission denied error
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
