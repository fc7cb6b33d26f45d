//! Store error taxonomy.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required input is missing, empty or malformed. No I/O was attempted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The store was disposed before the call.
    #[error("cannot access a disposed object: {0}")]
    ObjectDisposed(&'static str),

    /// The cancellation token fired, either at entry or while I/O was pending.
    #[error("the operation was cancelled")]
    OperationCancelled,

    /// A role-assignment operation named a role that does not exist.
    #[error("role not found: {0}")]
    RoleNotFound(String),

    /// Backing-store failure, propagated unchanged.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl StoreError {
    /// Shorthand for [`StoreError::InvalidArgument`].
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;
