//! SurrealDB implementation of [`DataStore`].
//!
//! Creates check for an existing key first and report a collision as
//! `None`; the UNIQUE indexes still reject a concurrent duplicate, which
//! then surfaces as a database error. Grant reads join the current role
//! (and resource) records in.

use std::collections::HashMap;

use canopy_core::error::CanopyResult;
use canopy_core::ids::{AccountId, ResourceType, RoleId, TenantId};
use canopy_core::models::{
    access::{CreateResourceAccess, CreateTenantAccess, ResourceAccess, TenantAccess},
    account::Account,
    resource::{Resource, ResourceKey, ResourceOwnership},
    role::Role,
    tenant::{CreateTenant, Tenant},
};
use canopy_core::store::DataStore;
use surrealdb::{Connection, Surreal};
use tracing::debug;

use crate::error::DbError;
use crate::rows::{
    AccountRow, OwnershipRow, ResourceAccessRow, ResourceRow, RoleRow, TenantAccessRow,
    TenantRow, resource_key,
};

const RESOURCE_ACCESS_BY_KEY: &str = "SELECT * FROM resource_access \
     WHERE account_id = $account_id \
     AND resource_id = $resource_id \
     AND resource_type = $resource_type";

/// SurrealDB-backed data store.
#[derive(Clone)]
pub struct SurrealStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Roles keyed by id, for joining into grant listings.
    async fn roles_by_id(&self) -> CanopyResult<HashMap<RoleId, Role>> {
        Ok(self
            .list_roles()
            .await?
            .into_iter()
            .map(|role| (role.id.clone(), role))
            .collect())
    }

    async fn join_resource_access(&self, row: ResourceAccessRow) -> CanopyResult<ResourceAccess> {
        let resource = resource_key(row.resource_id, row.resource_type);
        let role_id = RoleId::from(row.role_id);
        let role = self.get_role(&role_id).await?;
        let resource_record = self.get_resource(&resource).await?;
        Ok(ResourceAccess {
            account_id: row.account_id.into(),
            resource,
            role_id,
            granted_at: row.granted_at,
            role,
            resource_record,
        })
    }

    async fn join_tenant_access(&self, row: TenantAccessRow) -> CanopyResult<TenantAccess> {
        let role_id = RoleId::from(row.role_id);
        let role = self.get_role(&role_id).await?;
        Ok(TenantAccess {
            account_id: row.account_id.into(),
            tenant_id: row.tenant_id.into(),
            role_id,
            granted_at: row.granted_at,
            role,
        })
    }
}

impl<C: Connection> DataStore for SurrealStore<C> {
    // -----------------------------------------------------------------------
    // Tenants
    // -----------------------------------------------------------------------

    async fn create_tenant(&self, input: CreateTenant) -> CanopyResult<Option<Tenant>> {
        if self.get_tenant(&input.id).await?.is_some() {
            debug!(tenant_id = %input.id, "Tenant already exists");
            return Ok(None);
        }

        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 tenant_id = $id, name = $name, parent_id = $parent_id",
            )
            .bind(("id", input.id.into_inner()))
            .bind(("name", input.name))
            .bind(("parent_id", input.parent_id.map(TenantId::into_inner)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    async fn get_tenant(&self, id: &TenantId) -> CanopyResult<Option<Tenant>> {
        let mut result = self
            .db
            .query("SELECT * FROM tenant WHERE tenant_id = $id")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    async fn list_tenants(&self) -> CanopyResult<Vec<Tenant>> {
        let mut result = self
            .db
            .query("SELECT * FROM tenant ORDER BY tenant_id ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    // -----------------------------------------------------------------------
    // Roles
    // -----------------------------------------------------------------------

    async fn create_role(&self, role: Role) -> CanopyResult<Option<Role>> {
        if self.get_role(&role.id).await?.is_some() {
            debug!(role_id = %role.id, "Role already exists");
            return Ok(None);
        }

        let permissions: Vec<String> = role.permissions.into_iter().collect();
        let result = self
            .db
            .query(
                "CREATE type::record('role', $id) SET \
                 role_id = $id, name = $name, \
                 description = $description, permissions = $permissions",
            )
            .bind(("id", role.id.into_inner()))
            .bind(("name", role.name))
            .bind(("description", role.description))
            .bind(("permissions", permissions))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    async fn get_role(&self, id: &RoleId) -> CanopyResult<Option<Role>> {
        let mut result = self
            .db
            .query("SELECT * FROM role WHERE role_id = $id")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    async fn list_roles(&self) -> CanopyResult<Vec<Role>> {
        let mut result = self
            .db
            .query("SELECT * FROM role ORDER BY role_id ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    // -----------------------------------------------------------------------
    // Resources & ownership
    // -----------------------------------------------------------------------

    async fn create_resource(&self, resource: Resource) -> CanopyResult<Option<Resource>> {
        if self.get_resource(&resource.key).await?.is_some() {
            debug!(resource = %resource.key, "Resource already exists");
            return Ok(None);
        }

        let resource_type = resource.key.type_str().to_owned();
        let result = self
            .db
            .query(
                "CREATE resource SET \
                 resource_id = $resource_id, resource_type = $resource_type",
            )
            .bind(("resource_id", resource.key.id.into_inner()))
            .bind(("resource_type", resource_type))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    async fn get_resource(&self, key: &ResourceKey) -> CanopyResult<Option<Resource>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM resource \
                 WHERE resource_id = $resource_id AND resource_type = $resource_type",
            )
            .bind(("resource_id", key.id.to_string()))
            .bind(("resource_type", key.type_str().to_owned()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    async fn list_resources(&self) -> CanopyResult<Vec<Resource>> {
        let mut result = self
            .db
            .query("SELECT * FROM resource ORDER BY resource_id ASC, resource_type ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_ownership(
        &self,
        ownership: ResourceOwnership,
    ) -> CanopyResult<Option<ResourceOwnership>> {
        if self.get_ownership(&ownership.resource).await?.is_some() {
            debug!(resource = %ownership.resource, "Ownership already recorded");
            return Ok(None);
        }

        let resource_type = ownership.resource.type_str().to_owned();
        let result = self
            .db
            .query(
                "CREATE resource_ownership SET \
                 resource_id = $resource_id, resource_type = $resource_type, \
                 tenant_id = $tenant_id",
            )
            .bind(("resource_id", ownership.resource.id.into_inner()))
            .bind(("resource_type", resource_type))
            .bind(("tenant_id", ownership.tenant_id.into_inner()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<OwnershipRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    async fn get_ownership(&self, key: &ResourceKey) -> CanopyResult<Option<ResourceOwnership>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM resource_ownership \
                 WHERE resource_id = $resource_id AND resource_type = $resource_type",
            )
            .bind(("resource_id", key.id.to_string()))
            .bind(("resource_type", key.type_str().to_owned()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OwnershipRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    async fn change_owner(
        &self,
        key: &ResourceKey,
        new_owner: &TenantId,
    ) -> CanopyResult<Option<ResourceOwnership>> {
        if self.get_tenant(new_owner).await?.is_none() {
            debug!(resource = %key, tenant_id = %new_owner, "Target tenant does not exist");
            return Ok(None);
        }

        let result = self
            .db
            .query(
                "UPDATE resource_ownership SET tenant_id = $tenant_id \
                 WHERE resource_id = $resource_id AND resource_type = $resource_type",
            )
            .bind(("tenant_id", new_owner.to_string()))
            .bind(("resource_id", key.id.to_string()))
            .bind(("resource_type", key.type_str().to_owned()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<OwnershipRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    async fn list_ownerships(&self) -> CanopyResult<Vec<ResourceOwnership>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM resource_ownership \
                 ORDER BY resource_id ASC, resource_type ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OwnershipRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    // -----------------------------------------------------------------------
    // Resource access
    // -----------------------------------------------------------------------

    async fn create_resource_access(
        &self,
        input: CreateResourceAccess,
    ) -> CanopyResult<Option<ResourceAccess>> {
        if self
            .get_resource_access(&input.account_id, &input.resource)
            .await?
            .is_some()
        {
            debug!(
                account_id = %input.account_id,
                resource = %input.resource,
                "Resource access already granted"
            );
            return Ok(None);
        }

        let resource_type = input.resource.type_str().to_owned();
        let result = self
            .db
            .query(
                "CREATE resource_access SET \
                 account_id = $account_id, resource_id = $resource_id, \
                 resource_type = $resource_type, role_id = $role_id",
            )
            .bind(("account_id", input.account_id.into_inner()))
            .bind(("resource_id", input.resource.id.into_inner()))
            .bind(("resource_type", resource_type))
            .bind(("role_id", input.role_id.into_inner()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<ResourceAccessRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(self.join_resource_access(row).await?)),
            None => Ok(None),
        }
    }

    async fn get_resource_access(
        &self,
        account_id: &AccountId,
        key: &ResourceKey,
    ) -> CanopyResult<Option<ResourceAccess>> {
        let mut result = self
            .db
            .query(RESOURCE_ACCESS_BY_KEY)
            .bind(("account_id", account_id.to_string()))
            .bind(("resource_id", key.id.to_string()))
            .bind(("resource_type", key.type_str().to_owned()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceAccessRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(self.join_resource_access(row).await?)),
            None => Ok(None),
        }
    }

    async fn delete_resource_access(
        &self,
        account_id: &AccountId,
        key: &ResourceKey,
    ) -> CanopyResult<Option<ResourceAccess>> {
        let Some(existing) = self.get_resource_access(account_id, key).await? else {
            return Ok(None);
        };

        self.db
            .query(
                "DELETE resource_access \
                 WHERE account_id = $account_id \
                 AND resource_id = $resource_id \
                 AND resource_type = $resource_type",
            )
            .bind(("account_id", account_id.to_string()))
            .bind(("resource_id", key.id.to_string()))
            .bind(("resource_type", key.type_str().to_owned()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(Some(existing))
    }

    async fn list_resource_accesses(&self) -> CanopyResult<Vec<ResourceAccess>> {
        let roles = self.roles_by_id().await?;
        let resources: HashMap<ResourceKey, Resource> = self
            .list_resources()
            .await?
            .into_iter()
            .map(|r| (r.key.clone(), r))
            .collect();

        let mut result = self
            .db
            .query(
                "SELECT * FROM resource_access \
                 ORDER BY account_id ASC, resource_id ASC, resource_type ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceAccessRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let resource = resource_key(row.resource_id, row.resource_type);
                let role_id = RoleId::from(row.role_id);
                ResourceAccess {
                    account_id: row.account_id.into(),
                    role: roles.get(&role_id).cloned(),
                    resource_record: resources.get(&resource).cloned(),
                    resource,
                    role_id,
                    granted_at: row.granted_at,
                }
            })
            .collect())
    }

    async fn list_resources_of(
        &self,
        account_id: &AccountId,
        resource_type: Option<&ResourceType>,
    ) -> CanopyResult<Vec<Resource>> {
        let resource_type = resource_type.map_or_else(String::new, ToString::to_string);
        let mut result = self
            .db
            .query(
                "SELECT * FROM resource \
                 WHERE resource_type = $resource_type \
                 AND resource_id IN (\
                     SELECT VALUE resource_id FROM resource_access \
                     WHERE account_id = $account_id \
                     AND resource_type = $resource_type\
                 ) \
                 ORDER BY resource_id ASC",
            )
            .bind(("account_id", account_id.to_string()))
            .bind(("resource_type", resource_type))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    // -----------------------------------------------------------------------
    // Tenant access
    // -----------------------------------------------------------------------

    async fn create_tenant_access(
        &self,
        input: CreateTenantAccess,
    ) -> CanopyResult<Option<TenantAccess>> {
        if self
            .get_tenant_access(&input.account_id, &input.tenant_id)
            .await?
            .is_some()
        {
            debug!(
                account_id = %input.account_id,
                tenant_id = %input.tenant_id,
                "Tenant access already granted"
            );
            return Ok(None);
        }

        let result = self
            .db
            .query(
                "CREATE tenant_access SET \
                 account_id = $account_id, tenant_id = $tenant_id, role_id = $role_id",
            )
            .bind(("account_id", input.account_id.into_inner()))
            .bind(("tenant_id", input.tenant_id.into_inner()))
            .bind(("role_id", input.role_id.into_inner()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<TenantAccessRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(self.join_tenant_access(row).await?)),
            None => Ok(None),
        }
    }

    async fn get_tenant_access(
        &self,
        account_id: &AccountId,
        tenant_id: &TenantId,
    ) -> CanopyResult<Option<TenantAccess>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM tenant_access \
                 WHERE account_id = $account_id AND tenant_id = $tenant_id",
            )
            .bind(("account_id", account_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantAccessRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(self.join_tenant_access(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_tenant_accesses(&self) -> CanopyResult<Vec<TenantAccess>> {
        let roles = self.roles_by_id().await?;

        let mut result = self
            .db
            .query("SELECT * FROM tenant_access ORDER BY account_id ASC, tenant_id ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantAccessRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let role_id = RoleId::from(row.role_id);
                TenantAccess {
                    account_id: row.account_id.into(),
                    tenant_id: row.tenant_id.into(),
                    role: roles.get(&role_id).cloned(),
                    role_id,
                    granted_at: row.granted_at,
                }
            })
            .collect())
    }

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    async fn create_account(&self, account: Account) -> CanopyResult<Option<Account>> {
        if self.get_account(&account.id).await?.is_some() {
            debug!(account_id = %account.id, "Account already exists");
            return Ok(None);
        }

        let result = self
            .db
            .query(
                "CREATE type::record('account', $id) SET \
                 account_id = $id, name = $name, email = $email, \
                 organization = $organization",
            )
            .bind(("id", account.id.into_inner()))
            .bind(("name", account.name))
            .bind(("email", account.email))
            .bind(("organization", account.organization))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    async fn get_account(&self, id: &AccountId) -> CanopyResult<Option<Account>> {
        let mut result = self
            .db
            .query("SELECT * FROM account WHERE account_id = $id")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    async fn list_accounts(&self) -> CanopyResult<Vec<Account>> {
        let mut result = self
            .db
            .query("SELECT * FROM account ORDER BY account_id ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
