//! Document-store identity core - shared types and contracts.
//!
//! This crate provides the pieces shared between the identity store adapter
//! and anything that embeds or backs it:
//! - `docstore-identity` - Role and user stores over a document database
//! - `docstore-identity-cli` - Operator tooling
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database
//! drivers. The stores depend on the [`gateway`] contract, and the identity
//! framework depends on the [`stores`] capability traits; neither side needs
//! to know about the other's concrete types.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe record identifiers
//! - [`gateway`] - Document-collection gateway contract and filter predicates
//! - [`error`] - Store error taxonomy
//! - [`stores`] - Capability traits the identity framework consumes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod gateway;
pub mod stores;
pub mod types;

pub use error::{Result, StoreError};
pub use gateway::{Document, DocumentCollection, DocumentDatabase, Filter, GatewayError};
pub use stores::{RoleStore, UserEmailStore, UserPasswordStore, UserRoleStore, UserStore};
pub use types::*;
