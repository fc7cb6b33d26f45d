//! Command implementations.
//!
//! Each command takes the registered stores and a cancellation token, so the
//! same code runs against MongoDB from `main` and against the in-memory
//! gateway in tests.

pub mod role;
pub mod user;

use thiserror::Error;

use docstore_identity::{
    ConfigError, IdentityConfig, IdentityStores, RoleRecord, StoreError, UserRecord,
};
use docstore_identity_core::GatewayError;

/// The stores the CLI operates on.
pub type Stores = IdentityStores<UserRecord, RoleRecord>;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The database could not be reached.
    #[error("Database connection error: {0}")]
    Connection(#[from] GatewayError),

    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Password hashing failed.
    #[error("Failed to hash password")]
    PasswordHash,

    /// Unknown user or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No role with this name.
    #[error("Role not found: {0}")]
    RoleNotFound(String),

    /// No user with this name.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Role already exists.
    #[error("Role already exists: {0}")]
    RoleExists(String),

    /// User already exists.
    #[error("User already exists: {0}")]
    UserExists(String),
}

/// Load configuration from the environment and connect.
///
/// # Errors
///
/// Returns `CliError::Config` for missing or invalid settings and
/// `CliError::Connection` if the driver rejects the endpoint.
pub async fn connect() -> Result<Stores, CliError> {
    let config = IdentityConfig::from_env()?;
    tracing::info!(database = %config.database_name, "Connecting to identity database...");
    Ok(IdentityStores::connect(&config).await?)
}

/// Normalize a user name, email or role name for lookup.
#[must_use]
pub fn normalize(value: &str) -> String {
    value.to_uppercase()
}
