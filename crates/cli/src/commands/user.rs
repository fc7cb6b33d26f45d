//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! idstore user register -u alice -e alice@example.com -p 'correct horse'
//! idstore user grant -u alice -r Admin
//! idstore user roles -u alice
//! idstore user login -u alice -p 'correct horse'
//! idstore user revoke -u alice -r Admin
//! ```

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;

use docstore_identity::{
    DocumentUserStore, RoleRecord, UserEmailStore, UserPasswordStore, UserRecord, UserRoleStore,
    UserStore,
};

use super::{CliError, Stores, normalize};

/// Register a user with a password.
///
/// # Errors
///
/// Returns `CliError::UserExists` if the user name is taken.
pub async fn register(
    stores: &Stores,
    user_name: &str,
    email: &str,
    password: &SecretString,
    cancel: &CancellationToken,
) -> Result<UserRecord, CliError> {
    let users = stores.user_store();
    let normalized = normalize(user_name);

    if users.find_by_name(&normalized, cancel).await?.is_some() {
        return Err(CliError::UserExists(user_name.to_owned()));
    }

    let mut user = UserRecord::new(user_name, email);
    users.set_normalized_user_name(&mut user, &normalized, cancel)?;
    users.set_normalized_email(&mut user, Some(normalize(email).as_str()), cancel)?;
    let hash = hash_password(password.expose_secret())?;
    users.set_password_hash(&mut user, &hash, cancel)?;
    users.create(&mut user, cancel).await?;

    let id = users.user_id(&user, cancel)?;
    tracing::info!(user = %user_name, id = %id, "User registered");
    Ok(user)
}

/// Add a user to a role.
///
/// # Errors
///
/// Returns `CliError::UserNotFound` for an unknown user, or
/// `CliError::Store` wrapping `RoleNotFound` for an unknown role.
pub async fn grant(
    stores: &Stores,
    user_name: &str,
    role: &str,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let users = stores.user_store();
    let user = find_user(&users, user_name, cancel).await?;
    users.add_to_role(&user, &normalize(role), cancel).await?;

    tracing::info!(user = %user_name, role = %role, "Role granted");
    Ok(())
}

/// Remove a user from a role.
///
/// # Errors
///
/// Returns `CliError::UserNotFound` for an unknown user, or
/// `CliError::Store` wrapping `RoleNotFound` for an unknown role.
pub async fn revoke(
    stores: &Stores,
    user_name: &str,
    role: &str,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let users = stores.user_store();
    let user = find_user(&users, user_name, cancel).await?;
    users.remove_from_role(&user, &normalize(role), cancel).await?;

    tracing::info!(user = %user_name, role = %role, "Role revoked");
    Ok(())
}

/// List a user's roles.
///
/// # Errors
///
/// Returns `CliError::UserNotFound` for an unknown user.
pub async fn roles(
    stores: &Stores,
    user_name: &str,
    cancel: &CancellationToken,
) -> Result<Vec<String>, CliError> {
    let users = stores.user_store();
    let user = find_user(&users, user_name, cancel).await?;
    let roles = users.roles(&user, cancel).await?;

    tracing::info!(user = %user_name, roles = ?roles, "User roles");
    Ok(roles)
}

/// Check a user's password and report their roles.
///
/// # Errors
///
/// Returns `CliError::InvalidCredentials` if the user is unknown, has no
/// password, or the password does not match.
pub async fn login(
    stores: &Stores,
    user_name: &str,
    password: &SecretString,
    cancel: &CancellationToken,
) -> Result<Vec<String>, CliError> {
    let users = stores.user_store();
    let user = users
        .find_by_name(&normalize(user_name), cancel)
        .await?
        .ok_or(CliError::InvalidCredentials)?;

    if !users.has_password(&user, cancel)? {
        tracing::warn!(user = %user_name, "Login attempted for user without password");
        return Err(CliError::InvalidCredentials);
    }
    let hash = users
        .password_hash(&user, cancel)?
        .ok_or(CliError::InvalidCredentials)?;
    verify_password(password.expose_secret(), &hash)?;

    let roles = users.roles(&user, cancel).await?;
    tracing::info!(
        user = %user_name,
        email_confirmed = users.email_confirmed(&user, cancel)?,
        roles = ?roles,
        "Login succeeded"
    );
    Ok(roles)
}

async fn find_user(
    users: &DocumentUserStore<UserRecord, RoleRecord>,
    user_name: &str,
    cancel: &CancellationToken,
) -> Result<UserRecord, CliError> {
    users
        .find_by_name(&normalize(user_name), cancel)
        .await?
        .ok_or_else(|| CliError::UserNotFound(user_name.to_owned()))
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, CliError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| CliError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), CliError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| CliError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| CliError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use docstore_identity::{MemoryDatabase, StoreError};

    use super::*;
    use crate::commands::role;

    fn stores() -> Stores {
        Stores::new(Arc::new(MemoryDatabase::new()))
    }

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_owned())
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("battery staple", &hash),
            Err(CliError::InvalidCredentials)
        ));
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(CliError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let stores = stores();
        let cancel = CancellationToken::new();
        role::create(&stores, "Admin", &cancel).await.unwrap();

        let user = register(&stores, "alice", "Alice@Example.com", &secret("pw-1"), &cancel)
            .await
            .unwrap();
        assert_eq!(user.normalized_user_name(), Some("ALICE"));
        assert_eq!(user.normalized_email(), Some("ALICE@EXAMPLE.COM"));

        grant(&stores, "alice", "admin", &cancel).await.unwrap();
        let granted = login(&stores, "Alice", &secret("pw-1"), &cancel).await.unwrap();
        assert_eq!(granted, ["Admin"]);

        let err = login(&stores, "alice", &secret("wrong"), &cancel).await.unwrap_err();
        assert!(matches!(err, CliError::InvalidCredentials));

        revoke(&stores, "alice", "Admin", &cancel).await.unwrap();
        assert!(roles(&stores, "alice", &cancel).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_duplicate_user() {
        let stores = stores();
        let cancel = CancellationToken::new();
        let users = stores.user_store();

        let mut existing = UserRecord::new("bob", "bob@example.com");
        users.set_normalized_user_name(&mut existing, "BOB", &cancel).unwrap();
        users.create(&mut existing, &cancel).await.unwrap();

        let err = register(&stores, "Bob", "b@example.com", &secret("pw"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::UserExists(_)));
    }

    #[tokio::test]
    async fn test_login_without_password() {
        let stores = stores();
        let cancel = CancellationToken::new();
        let users = stores.user_store();

        let mut carol = UserRecord::new("carol", "carol@example.com");
        users.set_normalized_user_name(&mut carol, "CAROL", &cancel).unwrap();
        users.create(&mut carol, &cancel).await.unwrap();

        let err = login(&stores, "carol", &secret("pw"), &cancel).await.unwrap_err();
        assert!(matches!(err, CliError::InvalidCredentials));
        let err = login(&stores, "nobody", &secret("pw"), &cancel).await.unwrap_err();
        assert!(matches!(err, CliError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_grant_unknown_user_or_role() {
        let stores = stores();
        let cancel = CancellationToken::new();

        let err = grant(&stores, "ghost", "Admin", &cancel).await.unwrap_err();
        assert!(matches!(err, CliError::UserNotFound(_)));

        let users = stores.user_store();
        let mut dave = UserRecord::new("dave", "dave@example.com");
        users.set_normalized_user_name(&mut dave, "DAVE", &cancel).unwrap();
        users.create(&mut dave, &cancel).await.unwrap();

        let err = grant(&stores, "dave", "Admin", &cancel).await.unwrap_err();
        assert!(matches!(err, CliError::Store(StoreError::RoleNotFound(ref r)) if r == "ADMIN"));
    }
}
