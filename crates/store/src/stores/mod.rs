//! Role and user stores over a document database.
//!
//! Every operation follows the same preamble:
//!
//! 1. cancellation token already fired - `OperationCancelled`
//! 2. store disposed - `ObjectDisposed`
//! 3. argument validation - `InvalidArgument`
//!
//! and only then touches the gateway. Gateway calls are raced against the
//! token, so a cancellation that arrives mid-flight also surfaces as
//! `OperationCancelled` (the backing store may still apply the write).

pub mod role_store;
pub mod user_store;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use docstore_identity_core::{GatewayError, Result, StoreError};

pub use role_store::DocumentRoleStore;
pub use user_store::DocumentUserStore;

/// Collection holding role records.
pub const ROLES_COLLECTION: &str = "roles";
/// Collection holding user records.
pub const USERS_COLLECTION: &str = "users";
/// Collection holding membership records.
pub const USER_ROLES_COLLECTION: &str = "user_roles";

/// Active/disposed state of a store.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    store: &'static str,
    disposed: AtomicBool,
}

impl Lifecycle {
    pub(crate) const fn new(store: &'static str) -> Self {
        Self {
            store,
            disposed: AtomicBool::new(false),
        }
    }

    /// Fail fast if the call was cancelled or the store is disposed.
    pub(crate) fn ensure_active(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(StoreError::OperationCancelled);
        }
        if self.disposed.load(Ordering::Acquire) {
            return Err(StoreError::ObjectDisposed(self.store));
        }
        Ok(())
    }

    pub(crate) fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            tracing::debug!(store = self.store, "store disposed");
        }
    }
}

/// Run a gateway call, giving up as soon as the token fires.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, operation: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, GatewayError>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(StoreError::OperationCancelled),
        result = operation => Ok(result?),
    }
}

/// Reject an empty required string.
pub(crate) fn require_non_empty(value: &str, argument: &str) -> Result<()> {
    if value.is_empty() {
        return Err(StoreError::invalid_argument(format!(
            "{argument} must not be empty"
        )));
    }
    Ok(())
}

/// Reject an empty or whitespace-only role name.
pub(crate) fn require_role_name(value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::invalid_argument(
            "role name must not be empty or whitespace",
        ));
    }
    Ok(())
}
