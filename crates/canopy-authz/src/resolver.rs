//! Authorization resolution.
//!
//! A decision is made from data read fresh from the store on every call:
//!
//! 1. A direct [`ResourceAccess`](canopy_core::models::access::ResourceAccess)
//!    on the resource decides on its own, allow or deny.
//! 2. Otherwise the resource's owning tenant and then each ancestor in
//!    turn is checked for a
//!    [`TenantAccess`](canopy_core::models::access::TenantAccess); the
//!    nearest one decides.
//! 3. An unowned resource, or a walk that reaches a root without a grant,
//!    is denied.
//!
//! Grants never combine: a narrower grant that lacks the permission is
//! not overridden by a broader one further out.

use std::collections::HashSet;

use canopy_core::error::CanopyResult;
use canopy_core::ids::{AccountId, TenantId};
use canopy_core::models::resource::ResourceKey;
use canopy_core::store::DataStore;
use tracing::debug;

use crate::config::AuthzConfig;
use crate::error::AuthzError;

/// Resolves and administers access over a [`DataStore`].
///
/// Holds no entity state between calls, so a single instance can serve
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct Authorizer<S: DataStore> {
    pub(crate) store: S,
    pub(crate) config: AuthzConfig,
}

impl<S: DataStore> Authorizer<S> {
    pub fn new(store: S, config: AuthzConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Decide whether `account_id` holds `permission` on `resource`.
    ///
    /// Returns `Ok(false)` for every kind of "no access". Errors are
    /// storage faults: [`AuthzError::Cycle`] when a tenant repeats on the
    /// stored parent chain, or [`AuthzError::WalkTooDeep`] when an
    /// explicitly configured depth ceiling is exceeded.
    pub async fn authorize(
        &self,
        account_id: &AccountId,
        resource: &ResourceKey,
        permission: &str,
    ) -> CanopyResult<bool> {
        if let Some(access) = self.store.get_resource_access(account_id, resource).await? {
            let allowed = access.grants(permission);
            debug!(
                account_id = %account_id,
                resource = %resource,
                permission,
                role_id = %access.role_id,
                allowed,
                "Resolved by resource access"
            );
            return Ok(allowed);
        }

        let Some(ownership) = self.store.get_ownership(resource).await? else {
            debug!(
                account_id = %account_id,
                resource = %resource,
                permission,
                "Denied: resource has no owner"
            );
            return Ok(false);
        };

        self.walk_tenants(account_id, ownership.tenant_id, resource, permission)
            .await
    }

    async fn walk_tenants(
        &self,
        account_id: &AccountId,
        owner: TenantId,
        resource: &ResourceKey,
        permission: &str,
    ) -> CanopyResult<bool> {
        let limit = self.config.max_hierarchy_depth;
        let mut visited: HashSet<TenantId> = HashSet::new();
        let mut current = Some(owner);

        while let Some(tenant_id) = current {
            if let Some(limit) = limit.filter(|limit| visited.len() == *limit) {
                return Err(AuthzError::WalkTooDeep { tenant_id, limit }.into());
            }
            if !visited.insert(tenant_id.clone()) {
                return Err(AuthzError::Cycle(tenant_id).into());
            }

            if let Some(access) = self.store.get_tenant_access(account_id, &tenant_id).await? {
                let allowed = access.grants(permission);
                debug!(
                    account_id = %account_id,
                    resource = %resource,
                    permission,
                    tenant_id = %tenant_id,
                    role_id = %access.role_id,
                    depth = visited.len() - 1,
                    allowed,
                    "Resolved by tenant access"
                );
                return Ok(allowed);
            }

            current = self
                .store
                .get_tenant(&tenant_id)
                .await?
                .and_then(|tenant| tenant.parent_id);
        }

        debug!(
            account_id = %account_id,
            resource = %resource,
            permission,
            visited = visited.len(),
            "Denied: no grant up to the root"
        );
        Ok(false)
    }
}
