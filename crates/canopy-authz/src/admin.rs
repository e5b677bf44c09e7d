//! Access administration: the mutating half of [`Authorizer`].
//!
//! Each operation is a single store mutation. Collisions and missing
//! prerequisites come back as `None`, never as errors.

use canopy_core::error::CanopyResult;
use canopy_core::ids::{AccountId, ResourceType, RoleId, TenantId};
use canopy_core::models::{
    access::{CreateResourceAccess, CreateTenantAccess, ResourceAccess, TenantAccess},
    resource::{Resource, ResourceKey, ResourceOwnership},
};
use canopy_core::store::DataStore;
use tracing::{info, warn};

use crate::resolver::Authorizer;

impl<S: DataStore> Authorizer<S> {
    /// Grant `role_id` to `account_id` on one resource.
    ///
    /// Grants are not upserted: if the account already holds a grant on
    /// the resource this returns `None` and the existing grant stays.
    pub async fn grant_access(
        &self,
        account_id: AccountId,
        resource: ResourceKey,
        role_id: RoleId,
    ) -> CanopyResult<Option<ResourceAccess>> {
        let granted = self
            .store
            .create_resource_access(CreateResourceAccess {
                account_id: account_id.clone(),
                resource: resource.clone(),
                role_id: role_id.clone(),
            })
            .await?;

        match &granted {
            Some(_) => info!(
                account_id = %account_id,
                resource = %resource,
                role_id = %role_id,
                "Resource access granted"
            ),
            None => warn!(
                account_id = %account_id,
                resource = %resource,
                "Resource access already exists; revoke it first"
            ),
        }
        Ok(granted)
    }

    /// Grant `role_id` to `account_id` over a whole tenant subtree.
    pub async fn grant_tenant_access(
        &self,
        account_id: AccountId,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> CanopyResult<Option<TenantAccess>> {
        let granted = self
            .store
            .create_tenant_access(CreateTenantAccess {
                account_id: account_id.clone(),
                tenant_id: tenant_id.clone(),
                role_id: role_id.clone(),
            })
            .await?;

        match &granted {
            Some(_) => info!(
                account_id = %account_id,
                tenant_id = %tenant_id,
                role_id = %role_id,
                "Tenant access granted"
            ),
            None => warn!(
                account_id = %account_id,
                tenant_id = %tenant_id,
                "Tenant access already exists"
            ),
        }
        Ok(granted)
    }

    /// Remove the account's direct grant on a resource.
    ///
    /// Returns the removed grant, or `None` when there was nothing to
    /// delete. Tenant grants are not affected.
    pub async fn revoke_access(
        &self,
        account_id: &AccountId,
        resource: &ResourceKey,
    ) -> CanopyResult<Option<ResourceAccess>> {
        let revoked = self
            .store
            .delete_resource_access(account_id, resource)
            .await?;

        if revoked.is_some() {
            info!(account_id = %account_id, resource = %resource, "Resource access revoked");
        }
        Ok(revoked)
    }

    /// Move a resource to another tenant.
    ///
    /// Fails with `None` when the resource has no ownership record or the
    /// new owner does not exist. Existing grants are left alone, so
    /// access derived from the old owner's chain ends immediately.
    pub async fn change_ownership(
        &self,
        resource: &ResourceKey,
        new_owner: &TenantId,
    ) -> CanopyResult<Option<ResourceOwnership>> {
        let moved = self.store.change_owner(resource, new_owner).await?;

        match &moved {
            Some(_) => info!(resource = %resource, tenant_id = %new_owner, "Ownership transferred"),
            None => warn!(
                resource = %resource,
                tenant_id = %new_owner,
                "Ownership transfer rejected: no ownership record or unknown tenant"
            ),
        }
        Ok(moved)
    }

    /// Resources the account holds a direct grant on, of exactly
    /// `resource_type` (`None` lists untyped resources).
    ///
    /// Tenant grants are not expanded: a resource reachable only through
    /// a tenant grant is authorized by [`Authorizer::authorize`] but is
    /// not listed here.
    pub async fn get_resources_of(
        &self,
        account_id: &AccountId,
        resource_type: Option<&ResourceType>,
    ) -> CanopyResult<Vec<Resource>> {
        self.store.list_resources_of(account_id, resource_type).await
    }
}
