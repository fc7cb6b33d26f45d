//! Identity store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `IDENTITY_MONGODB_URL` - MongoDB connection string (falls back to `MONGODB_URL`)
//!
//! ## Optional
//! - `IDENTITY_DB` - Database name (default: identity)

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const ENDPOINT_VAR: &str = "IDENTITY_MONGODB_URL";
const ENDPOINT_FALLBACK_VAR: &str = "MONGODB_URL";
const DATABASE_VAR: &str = "IDENTITY_DB";
const DEFAULT_DATABASE: &str = "identity";

const ENDPOINT_SCHEMES: &[&str] = &["mongodb://", "mongodb+srv://"];
const FORBIDDEN_DATABASE_CHARS: &[char] = &['/', '\\', '.', ' ', '"', '$'];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Where the identity collections live.
///
/// Implements `Debug` manually to redact the endpoint, which usually carries
/// credentials.
#[derive(Clone)]
pub struct IdentityConfig {
    /// MongoDB connection string
    pub endpoint: SecretString,
    /// Database holding the `users`, `roles` and `user_roles` collections
    pub database_name: String,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("endpoint", &"[REDACTED]")
            .field("database_name", &self.database_name)
            .finish()
    }
}

impl IdentityConfig {
    /// Build a configuration from explicit values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the endpoint or database name is invalid.
    pub fn new(
        endpoint: SecretString,
        database_name: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let database_name = database_name.into();
        validate_endpoint(&endpoint, ENDPOINT_VAR)?;
        validate_database_name(&database_name, DATABASE_VAR)?;
        Ok(Self {
            endpoint,
            database_name,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the endpoint is missing or either value fails
    /// validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoint = get_endpoint(&lookup)?;
        let database_name = get_env_or_default(&lookup, DATABASE_VAR, DEFAULT_DATABASE);
        Self::new(endpoint, database_name)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get the endpoint with fallback to the generic `MONGODB_URL`.
fn get_endpoint(lookup: &impl Fn(&str) -> Option<String>) -> Result<SecretString, ConfigError> {
    lookup(ENDPOINT_VAR)
        .or_else(|| lookup(ENDPOINT_FALLBACK_VAR))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(ENDPOINT_VAR.to_string()))
}

/// Get a variable with a default value.
fn get_env_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

/// Validate that an endpoint is a MongoDB connection string with no
/// unfilled template placeholders.
fn validate_endpoint(endpoint: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = endpoint.expose_secret();

    if !ENDPOINT_SCHEMES.iter().any(|scheme| value.starts_with(scheme)) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("must start with one of {}", ENDPOINT_SCHEMES.join(", ")),
        ));
    }

    if value
        .split_once('<')
        .is_some_and(|(_, rest)| rest.contains('>'))
    {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            "appears to be a template (contains a '<...>' placeholder)".to_string(),
        ));
    }

    Ok(())
}

/// Validate a MongoDB database name.
fn validate_database_name(name: &str, var_name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must not be empty".to_string(),
        ));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_DATABASE_CHARS.contains(c)) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("must not contain '{c}'"),
        ));
    }
    Ok(())
}
