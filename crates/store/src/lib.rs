//! Identity user and role stores over a document database.
//!
//! Persists users, roles and the user-role membership join in three
//! collections (`users`, `roles`, `user_roles`) and exposes them through the
//! capability traits in [`docstore_identity_core::stores`].
//!
//! # Modules
//!
//! - [`models`] - Persisted records and the application type traits
//! - [`stores`] - `DocumentUserStore` and `DocumentRoleStore`
//! - [`registration`] - Composition-time wiring of both stores
//! - [`gateway`] - In-memory and MongoDB gateways
//! - [`config`] - Environment configuration
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use docstore_identity::{
//!     CancellationToken, IdentityStores, MemoryDatabase, RoleRecord, RoleStore, UserRecord,
//!     UserRoleStore, UserStore,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> docstore_identity::Result<()> {
//! let stores: IdentityStores<UserRecord, RoleRecord> =
//!     IdentityStores::new(Arc::new(MemoryDatabase::new()));
//! let cancel = CancellationToken::new();
//!
//! let roles = stores.role_store();
//! let mut admin = RoleRecord::new("Admin");
//! roles.set_normalized_role_name(&mut admin, "ADMIN", &cancel)?;
//! roles.create(&mut admin, &cancel).await?;
//!
//! let users = stores.user_store();
//! let mut alice = UserRecord::new("alice", "alice@example.com");
//! users.create(&mut alice, &cancel).await?;
//! users.add_to_role(&alice, "ADMIN", &cancel).await?;
//!
//! assert_eq!(users.roles(&alice, &cancel).await?, ["Admin"]);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod gateway;
pub mod models;
pub mod registration;
pub mod stores;

pub use config::{ConfigError, IdentityConfig};
pub use gateway::{CallCounts, MemoryCollection, MemoryDatabase};
#[cfg(feature = "mongodb")]
pub use gateway::MongoDatabase;
pub use models::{IdentityRole, IdentityUser, MembershipRecord, RoleRecord, UserRecord};
pub use registration::IdentityStores;
pub use stores::{
    DocumentRoleStore, DocumentUserStore, ROLES_COLLECTION, USER_ROLES_COLLECTION,
    USERS_COLLECTION,
};

pub use docstore_identity_core::{
    Result, RoleStore, StoreError, UserEmailStore, UserPasswordStore, UserRoleStore, UserStore,
};
pub use tokio_util::sync::CancellationToken;
