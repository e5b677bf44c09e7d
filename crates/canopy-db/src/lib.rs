//! Canopy Database — SurrealDB connection management and the durable
//! [`DataStore`](canopy_core::DataStore) implementation.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - The SurrealDB-backed store ([`SurrealStore`])
//! - Error types ([`DbError`])

mod connection;
mod error;
mod rows;
mod schema;
mod store;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
pub use store::SurrealStore;
