//! Service error taxonomy.
//!
//! Every operation surfaces one of these kinds to the boundary with the
//! discriminant intact; nothing is retried or swallowed here.

use taskhub_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The target does not exist, or the caller may not learn that it does
    /// (private lists are reported as missing to non-members).
    #[error("not found")]
    NotFound,

    /// Authenticated but lacking the required capability on a list the
    /// caller can see.
    #[error("forbidden")]
    Forbidden,

    /// Duplicate membership or concurrent state mismatch.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation would violate an invariant (e.g. removing the last
    /// owner, mutating todos of an archived list).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Malformed input shape or values.
    #[error("validation error: {0}")]
    Validation(String),

    /// A collaborator (storage, directory) failed; fatal for this request.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::AlreadyExists => ApiError::Conflict("already exists".to_string()),
            StoreError::Conflict => ApiError::Conflict("storage conflict".to_string()),
            StoreError::Backend(msg) => ApiError::Internal(msg),
        }
    }
}
