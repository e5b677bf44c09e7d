//! Tenant domain model.
//!
//! Tenants form a forest. A tenant only records the id of its parent;
//! child lists are reconstructed from the flat set of tenants when needed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::TenantId;

/// A node in the tenant forest.
///
/// A tenant without `parent_id` is a root. Tenants own resources and can
/// be granted to accounts as a whole, which authorizes every resource
/// owned by the tenant or any of its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    /// Human-readable name.
    pub name: String,
    pub parent_id: Option<TenantId>,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTenant {
    pub id: TenantId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<TenantId>,
}

impl CreateTenant {
    pub fn root(id: impl Into<TenantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
        }
    }

    pub fn child(
        id: impl Into<TenantId>,
        name: impl Into<String>,
        parent_id: impl Into<TenantId>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: Some(parent_id.into()),
        }
    }
}

/// A nested tenant description used to build a whole subtree at once.
///
/// Any parent id the caller might have in mind is ignored: the parent of
/// each node is the node it is nested under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantNode {
    pub id: TenantId,
    pub name: String,
    #[serde(default)]
    pub children: Vec<TenantNode>,
}

impl TenantNode {
    pub fn new(id: impl Into<TenantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: TenantNode) -> Self {
        self.children.push(child);
        self
    }
}
