//! Error types for Canopy.
//!
//! Lookup misses and key collisions are not errors: the store contract
//! reports them as `None`. The variants here cover faults the caller must
//! not ignore.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CanopyError {
    #[error(
        "Tenant {tenant_id} already exists: either the tree contains a cycle \
         or the tenant was already added"
    )]
    CycleOrDuplicate { tenant_id: String },

    #[error("Tenant hierarchy is corrupt at {tenant_id}: {reason}")]
    CorruptHierarchy { tenant_id: String, reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CanopyResult<T> = Result<T, CanopyError>;
