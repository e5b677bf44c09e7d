//! Canopy Core — domain models, error types and the data store contract
//! shared by every other Canopy crate.
//!
//! - Identifier newtypes ([`ids`])
//! - Tenants, roles, resources, ownership and access grants ([`models`])
//! - The [`DataStore`](store::DataStore) contract that persistence
//!   backends implement
//! - An in-process backend ([`MemoryStore`](memory::MemoryStore))

pub mod error;
pub mod ids;
pub mod memory;
pub mod models;
pub mod store;

pub use error::{CanopyError, CanopyResult};
pub use ids::{AccountId, ResourceId, ResourceType, RoleId, TenantId};
pub use memory::MemoryStore;
pub use store::DataStore;
