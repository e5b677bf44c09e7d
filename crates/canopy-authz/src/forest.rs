//! Read-only projection of the tenant forest.
//!
//! The store keeps tenants flat, each with a parent id only. This module
//! rebuilds child lists from a tenant snapshot when something needs to
//! look down the tree, and checks the parent relation for cycles and
//! dangling references.

use std::collections::BTreeMap;

use canopy_core::ids::TenantId;
use canopy_core::models::tenant::Tenant;

use crate::error::AuthzError;

#[derive(Debug, Clone, Default)]
pub struct TenantForest {
    tenants: BTreeMap<TenantId, Tenant>,
    children: BTreeMap<TenantId, Vec<TenantId>>,
}

impl TenantForest {
    pub fn from_tenants(tenants: impl IntoIterator<Item = Tenant>) -> Self {
        let tenants: BTreeMap<TenantId, Tenant> =
            tenants.into_iter().map(|t| (t.id.clone(), t)).collect();

        let mut children: BTreeMap<TenantId, Vec<TenantId>> = BTreeMap::new();
        for tenant in tenants.values() {
            if let Some(parent_id) = &tenant.parent_id {
                children
                    .entry(parent_id.clone())
                    .or_default()
                    .push(tenant.id.clone());
            }
        }

        Self { tenants, children }
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }

    pub fn get(&self, id: &TenantId) -> Option<&Tenant> {
        self.tenants.get(id)
    }

    /// Tenants without a parent, ordered by id.
    pub fn roots(&self) -> impl Iterator<Item = &Tenant> {
        self.tenants.values().filter(|t| t.is_root())
    }

    /// Direct children of `id`, ordered by id.
    pub fn children(&self, id: &TenantId) -> impl Iterator<Item = &Tenant> {
        self.children
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.tenants.get(child))
    }

    /// Ancestors of `id`, nearest first, not including `id` itself.
    ///
    /// The walk visits at most as many tenants as the forest holds, so a
    /// cyclic parent chain is reported instead of looping.
    pub fn ancestors(&self, id: &TenantId) -> Result<Vec<&Tenant>, AuthzError> {
        let mut ancestors = Vec::new();
        let mut current = self.tenants.get(id);

        while let Some(tenant) = current {
            let Some(parent_id) = &tenant.parent_id else {
                break;
            };
            let parent = self
                .tenants
                .get(parent_id)
                .ok_or_else(|| AuthzError::DanglingParent {
                    tenant_id: tenant.id.clone(),
                    parent_id: parent_id.clone(),
                })?;
            if parent.id == *id || ancestors.len() >= self.tenants.len() {
                return Err(AuthzError::Cycle(id.clone()));
            }
            ancestors.push(parent);
            current = Some(parent);
        }

        Ok(ancestors)
    }

    /// Number of ancestors of `id` (a root has depth 0).
    pub fn depth(&self, id: &TenantId) -> Result<usize, AuthzError> {
        self.ancestors(id).map(|a| a.len())
    }

    /// All tenants below `id` in pre-order, children ordered by id.
    pub fn descendants(&self, id: &TenantId) -> Vec<&Tenant> {
        let mut out = Vec::new();
        let mut stack: Vec<&Tenant> = self.children(id).collect();
        stack.reverse();

        while let Some(tenant) = stack.pop() {
            if out.len() == self.tenants.len() {
                break;
            }
            out.push(tenant);
            let mut next: Vec<&Tenant> = self.children(&tenant.id).collect();
            next.reverse();
            stack.extend(next);
        }

        out
    }

    /// Check that every parent reference resolves and that no tenant is
    /// its own ancestor.
    pub fn verify(&self) -> Result<(), AuthzError> {
        for id in self.tenants.keys() {
            self.ancestors(id)?;
        }
        Ok(())
    }
}
