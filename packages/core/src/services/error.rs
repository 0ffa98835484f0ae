//! Service Layer Error Types
//!
//! This module defines the closed error taxonomy surfaced by the document and
//! tree facades. Callers pattern-match on [`StoreError`] without depending on
//! any backend's error type.
//!
//! Every variant carries three static strings: a short description (also the
//! `Display` output), a failure reason, and a recovery suggestion.

use crate::db::BackendError;
use thiserror::Error;

/// Result alias for facade operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Facade operation errors
///
/// The set is closed and carries no dynamic payload. Raw backend failures are
/// converted into one of these kinds before they leave a facade.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreError {
    /// Path is malformed or does not exist
    #[error("Path not found.")]
    InvalidPath,

    /// Stored value does not match the requested type
    #[error("Invalid type.")]
    InvalidType,

    /// Collection target could not be resolved
    #[error("Collection not found.")]
    CollectionNotFound,

    /// Document target could not be resolved
    #[error("Document not found.")]
    DocumentNotFound,

    /// Referenced location does not exist in the store
    #[error("Reference not found.")]
    ReferenceNotFound,

    /// Backend failed for an unclassified reason
    #[error("Unknown error.")]
    UnknownError,

    /// Payload could not be converted to or from the model type
    #[error("Data did not parse.")]
    ParseError,

    /// Request is malformed or the operation is invalid for this call
    #[error("Request is invalid.")]
    InvalidRequest,

    /// Operation is not supported by this call
    #[error("Operation not supported.")]
    OperationNotSupported,

    /// Query clauses are malformed
    #[error("Query is not valid.")]
    InvalidQuery,

    /// Backend rejected the operation (rules, permissions)
    #[error("Operation not allowed.")]
    OperationNotAllowed,
}

impl StoreError {
    /// Every kind, in declaration order
    pub const ALL: [StoreError; 11] = [
        StoreError::InvalidPath,
        StoreError::InvalidType,
        StoreError::CollectionNotFound,
        StoreError::DocumentNotFound,
        StoreError::ReferenceNotFound,
        StoreError::UnknownError,
        StoreError::ParseError,
        StoreError::InvalidRequest,
        StoreError::OperationNotSupported,
        StoreError::InvalidQuery,
        StoreError::OperationNotAllowed,
    ];

    /// Short user-facing description of what happened
    pub fn description(&self) -> &'static str {
        match self {
            StoreError::InvalidPath => "Path not found.",
            StoreError::InvalidType => "Invalid type.",
            StoreError::CollectionNotFound => "Collection not found.",
            StoreError::DocumentNotFound => "Document not found.",
            StoreError::ReferenceNotFound => "Reference not found.",
            StoreError::UnknownError => "Unknown error.",
            StoreError::ParseError => "Data did not parse.",
            StoreError::InvalidRequest => "Request is invalid.",
            StoreError::OperationNotSupported => "Operation not supported.",
            StoreError::InvalidQuery => "Query is not valid.",
            StoreError::OperationNotAllowed => "Operation not allowed.",
        }
    }

    /// Why the failure occurred
    pub fn failure_reason(&self) -> &'static str {
        match self {
            StoreError::InvalidPath => "The specified path is invalid or does not exist.",
            StoreError::InvalidType => "The data type does not match the expected type.",
            StoreError::CollectionNotFound => "The requested collection could not be found.",
            StoreError::DocumentNotFound => "The requested document could not be found.",
            StoreError::ReferenceNotFound => "The requested reference could not be found.",
            StoreError::UnknownError => "An unexpected error occurred.",
            StoreError::ParseError => "Failed to parse the data into the expected format.",
            StoreError::InvalidRequest => "The request is invalid or malformed.",
            StoreError::OperationNotSupported => {
                "The requested operation is not supported by the current setup."
            }
            StoreError::InvalidQuery => "The query provided is invalid or malformed.",
            StoreError::OperationNotAllowed => {
                "The operation is not allowed due to configuration or policy restrictions."
            }
        }
    }

    /// How the caller can recover
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            StoreError::InvalidPath => "Check the path for typos or verify that it exists.",
            StoreError::InvalidType => "Ensure the data type matches the expected type.",
            StoreError::CollectionNotFound => {
                "Verify that the collection exists and the path is correct."
            }
            StoreError::DocumentNotFound => {
                "Ensure the document exists in the specified collection."
            }
            StoreError::ReferenceNotFound => "Check the reference path for correctness.",
            StoreError::UnknownError => "Try again or contact support for assistance.",
            StoreError::ParseError => "Verify the data format matches the expected structure.",
            StoreError::InvalidRequest => {
                "Review the request and ensure it meets all required criteria."
            }
            StoreError::OperationNotSupported => {
                "Consider alternative methods or consult the documentation."
            }
            StoreError::InvalidQuery => {
                "Check the query syntax and ensure it adheres to the API guidelines."
            }
            StoreError::OperationNotAllowed => {
                "Verify your configuration or permissions and try again."
            }
        }
    }
}

/// Uniform mapping used when no operation-specific kind applies
impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(_) => StoreError::ReferenceNotFound,
            BackendError::PermissionDenied(_) => StoreError::OperationNotAllowed,
            BackendError::InvalidArgument(_) => StoreError::InvalidRequest,
            BackendError::Unavailable(_) | BackendError::Internal(_) => StoreError::UnknownError,
        }
    }
}
