//! Tenant hierarchy builder.
//!
//! Populates a store at setup time: whole tenant subtrees, plus the
//! roles, resources and accounts attached to them.

use canopy_core::error::CanopyResult;
use canopy_core::ids::TenantId;
use canopy_core::models::{
    account::Account,
    resource::{Resource, ResourceOwnership},
    role::Role,
    tenant::{CreateTenant, Tenant, TenantNode},
};
use canopy_core::store::DataStore;
use tracing::{debug, info, warn};

use crate::error::AuthzError;
use crate::forest::TenantForest;

/// Builds the tenant forest and attaches entities to it.
#[derive(Debug, Clone)]
pub struct TenantBuilder<S: DataStore> {
    store: S,
}

impl<S: DataStore> TenantBuilder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Insert `root` and all of its descendants, parents before children,
    /// siblings in declared order.
    ///
    /// A node whose id is already in the store stops construction with
    /// [`AuthzError::CycleOrDuplicate`]: a node repeating an ancestor's id
    /// looks exactly like a tenant added twice, and either way the
    /// parentage of the rest of the subtree can no longer be trusted.
    /// Tenants inserted before the failing node stay in the store.
    pub async fn create_tenant_tree(&self, root: TenantNode) -> CanopyResult<Vec<Tenant>> {
        let mut created = Vec::new();
        let mut pending: Vec<(TenantNode, Option<TenantId>)> = vec![(root, None)];

        while let Some((node, parent_id)) = pending.pop() {
            if self.store.get_tenant(&node.id).await?.is_some() {
                warn!(tenant_id = %node.id, "Tenant already exists; aborting tree construction");
                return Err(AuthzError::CycleOrDuplicate(node.id).into());
            }

            let input = CreateTenant {
                id: node.id.clone(),
                name: node.name,
                parent_id,
            };
            let Some(tenant) = self.store.create_tenant(input).await? else {
                return Err(AuthzError::CycleOrDuplicate(node.id).into());
            };

            // Reversed so the first declared child is popped first.
            for child in node.children.into_iter().rev() {
                pending.push((child, Some(tenant.id.clone())));
            }
            created.push(tenant);
        }

        info!(count = created.len(), "Tenant tree created");
        Ok(created)
    }

    /// Insert a single tenant under an existing parent (or as a new root).
    ///
    /// Returns `None` when the id is taken or the parent does not exist.
    pub async fn add_tenant(&self, input: CreateTenant) -> CanopyResult<Option<Tenant>> {
        if let Some(parent_id) = &input.parent_id {
            if self.store.get_tenant(parent_id).await?.is_none() {
                warn!(tenant_id = %input.id, parent_id = %parent_id, "Parent tenant does not exist");
                return Ok(None);
            }
        }

        let tenant_id = input.id.clone();
        let created = self.store.create_tenant(input).await?;
        if created.is_none() {
            warn!(tenant_id = %tenant_id, "Tenant already exists");
        }
        Ok(created)
    }

    pub async fn add_role(&self, role: Role) -> CanopyResult<Option<Role>> {
        let role_id = role.id.clone();
        let created = self.store.create_role(role).await?;
        if created.is_none() {
            warn!(role_id = %role_id, "Role already exists");
        }
        Ok(created)
    }

    pub async fn add_account(&self, account: Account) -> CanopyResult<Option<Account>> {
        let account_id = account.id.clone();
        let created = self.store.create_account(account).await?;
        if created.is_none() {
            warn!(account_id = %account_id, "Account already exists");
        }
        Ok(created)
    }

    /// Attach `resource` to `tenant_id`, creating the resource record
    /// when it is not stored yet.
    ///
    /// A resource that already exists is reused, so a resource stored
    /// without an owner can still be attached here. Returns `true` exactly
    /// when the ownership record was created: `false` when the tenant
    /// does not exist (nothing is written) or the resource already has an
    /// owner.
    pub async fn add_resource(&self, resource: Resource, tenant_id: &TenantId) -> CanopyResult<bool> {
        if self.store.get_tenant(tenant_id).await?.is_none() {
            warn!(resource = %resource.key, tenant_id = %tenant_id, "Owner tenant does not exist");
            return Ok(false);
        }

        let key = resource.key.clone();
        if self.store.get_ownership(&key).await?.is_some() {
            warn!(resource = %key, "Resource already has an owner");
            return Ok(false);
        }

        if self.store.create_resource(resource).await?.is_none() {
            debug!(resource = %key, "Resource already stored; attaching owner");
        }

        let ownership = ResourceOwnership {
            resource: key.clone(),
            tenant_id: tenant_id.clone(),
        };
        if self.store.create_ownership(ownership).await?.is_none() {
            warn!(resource = %key, "Resource already has an owner");
            return Ok(false);
        }

        info!(resource = %key, tenant_id = %tenant_id, "Resource added");
        Ok(true)
    }

    /// Check the stored parent relation for cycles and dangling parents.
    ///
    /// The duplicate-id guard in [`Self::create_tenant_tree`] cannot see
    /// a cycle introduced by writing tenants directly to the store; this
    /// walks every tenant's ancestry, bounded by the tenant count.
    pub async fn verify_hierarchy(&self) -> CanopyResult<TenantForest> {
        let forest = TenantForest::from_tenants(self.store.list_tenants().await?);
        forest.verify()?;
        Ok(forest)
    }
}
