//! Gateway implementations.
//!
//! - [`memory`] - In-process collections with call counting, for tests and
//!   local tooling
//! - [`mongo`] - MongoDB driver (feature `mongodb`)

pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongo;

pub use memory::{CallCounts, MemoryCollection, MemoryDatabase};
#[cfg(feature = "mongodb")]
pub use mongo::MongoDatabase;
