//! DB-side row structs and their conversions into domain models.
//!
//! Every table stores its key columns as plain strings, so rows convert
//! without parsing. An empty `resource_type` is the untyped marker.

use canopy_core::ids::ResourceType;
use canopy_core::models::{
    account::Account,
    resource::{Resource, ResourceKey, ResourceOwnership},
    role::Role,
    tenant::Tenant,
};
use chrono::{DateTime, Utc};
use surrealdb_types::SurrealValue;

pub(crate) fn resource_key(resource_id: String, resource_type: String) -> ResourceKey {
    let resource_type = (!resource_type.is_empty()).then(|| ResourceType::new(resource_type));
    ResourceKey::new(resource_id, resource_type)
}

#[derive(Debug, SurrealValue)]
pub(crate) struct TenantRow {
    pub tenant_id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Tenant {
            id: row.tenant_id.into(),
            name: row.name,
            parent_id: row.parent_id.map(Into::into),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, SurrealValue)]
pub(crate) struct RoleRow {
    pub role_id: String,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            id: row.role_id.into(),
            name: row.name,
            description: row.description,
            permissions: row.permissions.into_iter().collect(),
        }
    }
}

#[derive(Debug, SurrealValue)]
pub(crate) struct ResourceRow {
    pub resource_id: String,
    pub resource_type: String,
}

impl From<ResourceRow> for Resource {
    fn from(row: ResourceRow) -> Self {
        Resource::new(resource_key(row.resource_id, row.resource_type))
    }
}

#[derive(Debug, SurrealValue)]
pub(crate) struct OwnershipRow {
    pub resource_id: String,
    pub resource_type: String,
    pub tenant_id: String,
}

impl From<OwnershipRow> for ResourceOwnership {
    fn from(row: OwnershipRow) -> Self {
        ResourceOwnership {
            resource: resource_key(row.resource_id, row.resource_type),
            tenant_id: row.tenant_id.into(),
        }
    }
}

/// A `resource_access` row before its role and resource are joined in.
#[derive(Debug, SurrealValue)]
pub(crate) struct ResourceAccessRow {
    pub account_id: String,
    pub resource_id: String,
    pub resource_type: String,
    pub role_id: String,
    pub granted_at: DateTime<Utc>,
}

/// A `tenant_access` row before its role is joined in.
#[derive(Debug, SurrealValue)]
pub(crate) struct TenantAccessRow {
    pub account_id: String,
    pub tenant_id: String,
    pub role_id: String,
    pub granted_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
pub(crate) struct AccountRow {
    pub account_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub organization: Option<String>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.account_id.into(),
            name: row.name,
            email: row.email,
            organization: row.organization,
        }
    }
}
