//! Role management commands.
//!
//! # Usage
//!
//! ```bash
//! idstore role create Admin
//! idstore role members Admin
//! idstore role delete Admin
//! ```

use tokio_util::sync::CancellationToken;

use docstore_identity::{RoleRecord, RoleStore, UserRecord, UserRoleStore};

use super::{CliError, Stores, normalize};

/// Create a role.
///
/// # Errors
///
/// Returns `CliError::RoleExists` if a role with the same normalized name is
/// already stored.
pub async fn create(
    stores: &Stores,
    name: &str,
    cancel: &CancellationToken,
) -> Result<RoleRecord, CliError> {
    let roles = stores.role_store();
    let normalized = normalize(name);

    if roles.find_by_name(&normalized, cancel).await?.is_some() {
        return Err(CliError::RoleExists(name.to_owned()));
    }

    let mut role = RoleRecord::new(name);
    roles.set_normalized_role_name(&mut role, &normalized, cancel)?;
    roles.create(&mut role, cancel).await?;

    let id = roles.role_id(&role, cancel)?;
    tracing::info!(role = %name, id = %id, "Role created");
    Ok(role)
}

/// Delete a role.
///
/// Memberships pointing at the role are left in place.
///
/// # Errors
///
/// Returns `CliError::RoleNotFound` if no such role exists.
pub async fn delete(stores: &Stores, name: &str, cancel: &CancellationToken) -> Result<(), CliError> {
    let roles = stores.role_store();

    let role = roles
        .find_by_name(&normalize(name), cancel)
        .await?
        .ok_or_else(|| CliError::RoleNotFound(name.to_owned()))?;
    roles.delete(&role, cancel).await?;

    tracing::info!(role = %name, "Role deleted");
    Ok(())
}

/// List the users holding a role.
///
/// # Errors
///
/// Returns `CliError::Store` wrapping `RoleNotFound` if no such role exists.
pub async fn members(
    stores: &Stores,
    name: &str,
    cancel: &CancellationToken,
) -> Result<Vec<UserRecord>, CliError> {
    let users = stores.user_store().users_in_role(&normalize(name), cancel).await?;

    tracing::info!(role = %name, count = users.len(), "Role members");
    for user in &users {
        tracing::info!("  {}", user.user_name().unwrap_or("<unnamed>"));
    }
    Ok(users)
}
