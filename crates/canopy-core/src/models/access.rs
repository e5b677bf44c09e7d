//! Access grant domain models.
//!
//! A [`ResourceAccess`] grants a role over one resource; a
//! [`TenantAccess`] grants a role over a tenant and, through it, over
//! every resource owned anywhere in that tenant's subtree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, RoleId, TenantId};
use crate::models::resource::{Resource, ResourceKey};
use crate::models::role::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAccess {
    pub account_id: AccountId,
    pub resource: ResourceKey,
    pub role_id: RoleId,
    pub granted_at: DateTime<Utc>,
    /// The granted role as currently stored, if it exists.
    pub role: Option<Role>,
    /// The resource record, if it exists.
    pub resource_record: Option<Resource>,
}

impl ResourceAccess {
    /// Whether this grant carries `permission`. A missing role grants
    /// nothing.
    pub fn grants(&self, permission: &str) -> bool {
        self.role.as_ref().is_some_and(|r| r.grants(permission))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantAccess {
    pub account_id: AccountId,
    pub tenant_id: TenantId,
    pub role_id: RoleId,
    pub granted_at: DateTime<Utc>,
    pub role: Option<Role>,
}

impl TenantAccess {
    pub fn grants(&self, permission: &str) -> bool {
        self.role.as_ref().is_some_and(|r| r.grants(permission))
    }
}

/// Fields required to grant a role over a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateResourceAccess {
    pub account_id: AccountId,
    pub resource: ResourceKey,
    pub role_id: RoleId,
}

/// Fields required to grant a role over a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTenantAccess {
    pub account_id: AccountId,
    pub tenant_id: TenantId,
    pub role_id: RoleId,
}
