//! Database abstraction layer
//!
//! This module provides a database-agnostic interface for schema discovery,
//! row retrieval and row mutation.

pub mod traits;

#[cfg(feature = "postgres")]
pub mod postgres;

// Re-export the main traits
pub use traits::{Connector, DatabaseError, DatabaseProvider};
