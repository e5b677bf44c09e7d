//! Authorization and hierarchy error types.

use canopy_core::error::CanopyError;
use canopy_core::ids::TenantId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("tenant {0} already exists; either a cycle was declared or it was already added")]
    CycleOrDuplicate(TenantId),

    #[error("tenant {tenant_id} references missing parent {parent_id}")]
    DanglingParent {
        tenant_id: TenantId,
        parent_id: TenantId,
    },

    #[error("tenant {0} is its own ancestor")]
    Cycle(TenantId),

    #[error("walk reached tenant {tenant_id} after the configured limit of {limit} tenants")]
    WalkTooDeep { tenant_id: TenantId, limit: usize },

    #[error("invalid seed document: {0}")]
    InvalidSeed(#[from] serde_json::Error),
}

impl From<AuthzError> for CanopyError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::CycleOrDuplicate(tenant_id) => CanopyError::CycleOrDuplicate {
                tenant_id: tenant_id.into_inner(),
            },
            AuthzError::DanglingParent { ref tenant_id, .. }
            | AuthzError::Cycle(ref tenant_id)
            | AuthzError::WalkTooDeep { ref tenant_id, .. } => CanopyError::CorruptHierarchy {
                tenant_id: tenant_id.to_string(),
                reason: err.to_string(),
            },
            AuthzError::InvalidSeed(e) => CanopyError::Validation {
                message: e.to_string(),
            },
        }
    }
}
