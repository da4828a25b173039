//! Database module
//!
//! Store traits, the Postgres implementation and the in-memory one.

pub mod memory;
pub mod models;
pub mod operations;
pub mod store;

pub use memory::MemoryStore;
pub use models::{PublicUser, User};
pub use operations::DbOperations;
pub use store::{ContentStore, EngagementStore, Store, UserStore};
