//! In-process implementation of [`DataStore`].
//!
//! Records live in ordered maps keyed exactly like the store contract
//! keys, so `list_*` results come back in key order. Grants keep only the
//! role id; the role is resolved from the role map on every read.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::error::{CanopyError, CanopyResult};
use crate::ids::{AccountId, ResourceType, RoleId, TenantId};
use crate::models::{
    access::{CreateResourceAccess, CreateTenantAccess, ResourceAccess, TenantAccess},
    account::Account,
    resource::{Resource, ResourceKey, ResourceOwnership},
    role::Role,
    tenant::{CreateTenant, Tenant},
};
use crate::store::DataStore;

#[derive(Debug, Clone)]
struct StoredGrant {
    role_id: RoleId,
    granted_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    tenants: BTreeMap<TenantId, Tenant>,
    roles: BTreeMap<RoleId, Role>,
    resources: BTreeMap<ResourceKey, Resource>,
    ownerships: BTreeMap<ResourceKey, ResourceOwnership>,
    resource_accesses: BTreeMap<(AccountId, ResourceKey), StoredGrant>,
    tenant_accesses: BTreeMap<(AccountId, TenantId), StoredGrant>,
    accounts: BTreeMap<AccountId, Account>,
}

impl Tables {
    fn hydrate_resource_access(
        &self,
        (account_id, key): &(AccountId, ResourceKey),
        grant: &StoredGrant,
    ) -> ResourceAccess {
        ResourceAccess {
            account_id: account_id.clone(),
            resource: key.clone(),
            role_id: grant.role_id.clone(),
            granted_at: grant.granted_at,
            role: self.roles.get(&grant.role_id).cloned(),
            resource_record: self.resources.get(key).cloned(),
        }
    }

    fn hydrate_tenant_access(
        &self,
        (account_id, tenant_id): &(AccountId, TenantId),
        grant: &StoredGrant,
    ) -> TenantAccess {
        TenantAccess {
            account_id: account_id.clone(),
            tenant_id: tenant_id.clone(),
            role_id: grant.role_id.clone(),
            granted_at: grant.granted_at,
            role: self.roles.get(&grant.role_id).cloned(),
        }
    }
}

/// A [`DataStore`] kept entirely in memory.
///
/// Cloning yields another handle to the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> CanopyResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| CanopyError::Internal(format!("memory store lock poisoned: {e}")))
    }

    fn write(&self) -> CanopyResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| CanopyError::Internal(format!("memory store lock poisoned: {e}")))
    }
}

impl DataStore for MemoryStore {
    async fn create_tenant(&self, input: CreateTenant) -> CanopyResult<Option<Tenant>> {
        let mut tables = self.write()?;
        if tables.tenants.contains_key(&input.id) {
            return Ok(None);
        }
        let tenant = Tenant {
            id: input.id,
            name: input.name,
            parent_id: input.parent_id,
            created_at: Utc::now(),
        };
        tables.tenants.insert(tenant.id.clone(), tenant.clone());
        Ok(Some(tenant))
    }

    async fn get_tenant(&self, id: &TenantId) -> CanopyResult<Option<Tenant>> {
        Ok(self.read()?.tenants.get(id).cloned())
    }

    async fn list_tenants(&self) -> CanopyResult<Vec<Tenant>> {
        Ok(self.read()?.tenants.values().cloned().collect())
    }

    async fn create_role(&self, role: Role) -> CanopyResult<Option<Role>> {
        let mut tables = self.write()?;
        if tables.roles.contains_key(&role.id) {
            return Ok(None);
        }
        tables.roles.insert(role.id.clone(), role.clone());
        Ok(Some(role))
    }

    async fn get_role(&self, id: &RoleId) -> CanopyResult<Option<Role>> {
        Ok(self.read()?.roles.get(id).cloned())
    }

    async fn list_roles(&self) -> CanopyResult<Vec<Role>> {
        Ok(self.read()?.roles.values().cloned().collect())
    }

    async fn create_resource(&self, resource: Resource) -> CanopyResult<Option<Resource>> {
        let mut tables = self.write()?;
        if tables.resources.contains_key(&resource.key) {
            return Ok(None);
        }
        tables
            .resources
            .insert(resource.key.clone(), resource.clone());
        Ok(Some(resource))
    }

    async fn get_resource(&self, key: &ResourceKey) -> CanopyResult<Option<Resource>> {
        Ok(self.read()?.resources.get(key).cloned())
    }

    async fn list_resources(&self) -> CanopyResult<Vec<Resource>> {
        Ok(self.read()?.resources.values().cloned().collect())
    }

    async fn create_ownership(
        &self,
        ownership: ResourceOwnership,
    ) -> CanopyResult<Option<ResourceOwnership>> {
        let mut tables = self.write()?;
        if tables.ownerships.contains_key(&ownership.resource) {
            return Ok(None);
        }
        tables
            .ownerships
            .insert(ownership.resource.clone(), ownership.clone());
        Ok(Some(ownership))
    }

    async fn get_ownership(&self, key: &ResourceKey) -> CanopyResult<Option<ResourceOwnership>> {
        Ok(self.read()?.ownerships.get(key).cloned())
    }

    async fn change_owner(
        &self,
        key: &ResourceKey,
        new_owner: &TenantId,
    ) -> CanopyResult<Option<ResourceOwnership>> {
        let mut tables = self.write()?;
        if !tables.tenants.contains_key(new_owner) {
            return Ok(None);
        }
        let Some(ownership) = tables.ownerships.get_mut(key) else {
            return Ok(None);
        };
        ownership.tenant_id = new_owner.clone();
        Ok(Some(ownership.clone()))
    }

    async fn list_ownerships(&self) -> CanopyResult<Vec<ResourceOwnership>> {
        Ok(self.read()?.ownerships.values().cloned().collect())
    }

    async fn create_resource_access(
        &self,
        input: CreateResourceAccess,
    ) -> CanopyResult<Option<ResourceAccess>> {
        let mut tables = self.write()?;
        let key = (input.account_id, input.resource);
        if tables.resource_accesses.contains_key(&key) {
            return Ok(None);
        }
        let grant = StoredGrant {
            role_id: input.role_id,
            granted_at: Utc::now(),
        };
        let access = tables.hydrate_resource_access(&key, &grant);
        tables.resource_accesses.insert(key, grant);
        Ok(Some(access))
    }

    async fn get_resource_access(
        &self,
        account_id: &AccountId,
        key: &ResourceKey,
    ) -> CanopyResult<Option<ResourceAccess>> {
        let tables = self.read()?;
        let key = (account_id.clone(), key.clone());
        Ok(tables
            .resource_accesses
            .get(&key)
            .map(|grant| tables.hydrate_resource_access(&key, grant)))
    }

    async fn delete_resource_access(
        &self,
        account_id: &AccountId,
        key: &ResourceKey,
    ) -> CanopyResult<Option<ResourceAccess>> {
        let mut tables = self.write()?;
        let key = (account_id.clone(), key.clone());
        let Some(grant) = tables.resource_accesses.remove(&key) else {
            return Ok(None);
        };
        Ok(Some(tables.hydrate_resource_access(&key, &grant)))
    }

    async fn list_resource_accesses(&self) -> CanopyResult<Vec<ResourceAccess>> {
        let tables = self.read()?;
        Ok(tables
            .resource_accesses
            .iter()
            .map(|(key, grant)| tables.hydrate_resource_access(key, grant))
            .collect())
    }

    async fn list_resources_of(
        &self,
        account_id: &AccountId,
        resource_type: Option<&ResourceType>,
    ) -> CanopyResult<Vec<Resource>> {
        let tables = self.read()?;
        Ok(tables
            .resource_accesses
            .keys()
            .filter(|(account, key)| {
                account == account_id && key.resource_type.as_ref() == resource_type
            })
            .filter_map(|(_, key)| tables.resources.get(key).cloned())
            .collect())
    }

    async fn create_tenant_access(
        &self,
        input: CreateTenantAccess,
    ) -> CanopyResult<Option<TenantAccess>> {
        let mut tables = self.write()?;
        let key = (input.account_id, input.tenant_id);
        if tables.tenant_accesses.contains_key(&key) {
            return Ok(None);
        }
        let grant = StoredGrant {
            role_id: input.role_id,
            granted_at: Utc::now(),
        };
        let access = tables.hydrate_tenant_access(&key, &grant);
        tables.tenant_accesses.insert(key, grant);
        Ok(Some(access))
    }

    async fn get_tenant_access(
        &self,
        account_id: &AccountId,
        tenant_id: &TenantId,
    ) -> CanopyResult<Option<TenantAccess>> {
        let tables = self.read()?;
        let key = (account_id.clone(), tenant_id.clone());
        Ok(tables
            .tenant_accesses
            .get(&key)
            .map(|grant| tables.hydrate_tenant_access(&key, grant)))
    }

    async fn list_tenant_accesses(&self) -> CanopyResult<Vec<TenantAccess>> {
        let tables = self.read()?;
        Ok(tables
            .tenant_accesses
            .iter()
            .map(|(key, grant)| tables.hydrate_tenant_access(key, grant))
            .collect())
    }

    async fn create_account(&self, account: Account) -> CanopyResult<Option<Account>> {
        let mut tables = self.write()?;
        if tables.accounts.contains_key(&account.id) {
            return Ok(None);
        }
        tables.accounts.insert(account.id.clone(), account.clone());
        Ok(Some(account))
    }

    async fn get_account(&self, id: &AccountId) -> CanopyResult<Option<Account>> {
        Ok(self.read()?.accounts.get(id).cloned())
    }

    async fn list_accounts(&self) -> CanopyResult<Vec<Account>> {
        Ok(self.read()?.accounts.values().cloned().collect())
    }
}
