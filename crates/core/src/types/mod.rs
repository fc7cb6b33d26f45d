//! Core types for the identity store.
//!
//! This module provides type-safe wrappers for record identifiers.

pub mod id;

pub use id::*;
