//! The data store contract.
//!
//! All operations are async. A lookup miss is `Ok(None)`, and so is a
//! create under a key that already exists: records are never overwritten.
//! `Err` is reserved for faults below the contract (connectivity,
//! corruption), which callers propagate unchanged.

use crate::error::CanopyResult;
use crate::ids::{AccountId, ResourceType, RoleId, TenantId};
use crate::models::{
    access::{CreateResourceAccess, CreateTenantAccess, ResourceAccess, TenantAccess},
    account::Account,
    resource::{Resource, ResourceKey, ResourceOwnership},
    role::Role,
    tenant::{CreateTenant, Tenant},
};

/// Capability interface every persistence backend provides.
///
/// Handles are expected to be cheap to clone and safe to share between
/// concurrent callers.
pub trait DataStore: Send + Sync {
    // -----------------------------------------------------------------------
    // Tenants
    // -----------------------------------------------------------------------

    /// Persist a tenant. Does not check that `parent_id` exists; the
    /// hierarchy builder owns that invariant.
    fn create_tenant(
        &self,
        input: CreateTenant,
    ) -> impl Future<Output = CanopyResult<Option<Tenant>>> + Send;
    fn get_tenant(&self, id: &TenantId)
    -> impl Future<Output = CanopyResult<Option<Tenant>>> + Send;
    fn list_tenants(&self) -> impl Future<Output = CanopyResult<Vec<Tenant>>> + Send;

    // -----------------------------------------------------------------------
    // Roles
    // -----------------------------------------------------------------------

    fn create_role(&self, role: Role) -> impl Future<Output = CanopyResult<Option<Role>>> + Send;
    fn get_role(&self, id: &RoleId) -> impl Future<Output = CanopyResult<Option<Role>>> + Send;
    fn list_roles(&self) -> impl Future<Output = CanopyResult<Vec<Role>>> + Send;

    // -----------------------------------------------------------------------
    // Resources & ownership
    // -----------------------------------------------------------------------

    fn create_resource(
        &self,
        resource: Resource,
    ) -> impl Future<Output = CanopyResult<Option<Resource>>> + Send;
    fn get_resource(
        &self,
        key: &ResourceKey,
    ) -> impl Future<Output = CanopyResult<Option<Resource>>> + Send;
    fn list_resources(&self) -> impl Future<Output = CanopyResult<Vec<Resource>>> + Send;

    fn create_ownership(
        &self,
        ownership: ResourceOwnership,
    ) -> impl Future<Output = CanopyResult<Option<ResourceOwnership>>> + Send;
    fn get_ownership(
        &self,
        key: &ResourceKey,
    ) -> impl Future<Output = CanopyResult<Option<ResourceOwnership>>> + Send;
    /// Point an existing ownership record at `new_owner`.
    ///
    /// Returns `None` when no ownership record exists for `key` or when
    /// `new_owner` does not name an existing tenant.
    fn change_owner(
        &self,
        key: &ResourceKey,
        new_owner: &TenantId,
    ) -> impl Future<Output = CanopyResult<Option<ResourceOwnership>>> + Send;
    fn list_ownerships(&self) -> impl Future<Output = CanopyResult<Vec<ResourceOwnership>>> + Send;

    // -----------------------------------------------------------------------
    // Resource access
    // -----------------------------------------------------------------------

    fn create_resource_access(
        &self,
        input: CreateResourceAccess,
    ) -> impl Future<Output = CanopyResult<Option<ResourceAccess>>> + Send;
    /// Fetch a grant with its role resolved from the current role record.
    fn get_resource_access(
        &self,
        account_id: &AccountId,
        key: &ResourceKey,
    ) -> impl Future<Output = CanopyResult<Option<ResourceAccess>>> + Send;
    /// Remove a grant. Returns the removed record, or `None` if there
    /// was nothing to delete.
    fn delete_resource_access(
        &self,
        account_id: &AccountId,
        key: &ResourceKey,
    ) -> impl Future<Output = CanopyResult<Option<ResourceAccess>>> + Send;
    fn list_resource_accesses(
        &self,
    ) -> impl Future<Output = CanopyResult<Vec<ResourceAccess>>> + Send;
    /// Resources the account holds a direct grant on, restricted to
    /// exactly `resource_type` (`None` matches only untyped resources).
    fn list_resources_of(
        &self,
        account_id: &AccountId,
        resource_type: Option<&ResourceType>,
    ) -> impl Future<Output = CanopyResult<Vec<Resource>>> + Send;

    // -----------------------------------------------------------------------
    // Tenant access
    // -----------------------------------------------------------------------

    fn create_tenant_access(
        &self,
        input: CreateTenantAccess,
    ) -> impl Future<Output = CanopyResult<Option<TenantAccess>>> + Send;
    fn get_tenant_access(
        &self,
        account_id: &AccountId,
        tenant_id: &TenantId,
    ) -> impl Future<Output = CanopyResult<Option<TenantAccess>>> + Send;
    fn list_tenant_accesses(&self) -> impl Future<Output = CanopyResult<Vec<TenantAccess>>> + Send;

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    fn create_account(
        &self,
        account: Account,
    ) -> impl Future<Output = CanopyResult<Option<Account>>> + Send;
    fn get_account(
        &self,
        id: &AccountId,
    ) -> impl Future<Output = CanopyResult<Option<Account>>> + Send;
    fn list_accounts(&self) -> impl Future<Output = CanopyResult<Vec<Account>>> + Send;
}
