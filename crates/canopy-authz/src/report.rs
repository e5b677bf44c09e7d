//! Plain-text report of everything in a store.
//!
//! [`Snapshot::capture`] reads every `list_*` result once; rendering is a
//! pure function of the snapshot and never touches the store.

use std::fmt;

use canopy_core::error::CanopyResult;
use canopy_core::models::{
    access::{ResourceAccess, TenantAccess},
    account::Account,
    resource::{Resource, ResourceOwnership},
    role::Role,
    tenant::Tenant,
};
use canopy_core::store::DataStore;

use crate::forest::TenantForest;

/// Every entity in a store at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub tenants: Vec<Tenant>,
    pub accounts: Vec<Account>,
    pub roles: Vec<Role>,
    pub resources: Vec<Resource>,
    pub ownerships: Vec<ResourceOwnership>,
    pub resource_accesses: Vec<ResourceAccess>,
    pub tenant_accesses: Vec<TenantAccess>,
}

impl Snapshot {
    pub async fn capture<S: DataStore>(store: &S) -> CanopyResult<Self> {
        let (tenants, accounts, roles, resources, ownerships, resource_accesses, tenant_accesses) = tokio::try_join!(
            store.list_tenants(),
            store.list_accounts(),
            store.list_roles(),
            store.list_resources(),
            store.list_ownerships(),
            store.list_resource_accesses(),
            store.list_tenant_accesses(),
        )?;

        Ok(Self {
            tenants,
            accounts,
            roles,
            resources,
            ownerships,
            resource_accesses,
            tenant_accesses,
        })
    }

    fn role_name<'a>(&'a self, role_id: &'a str) -> &'a str {
        self.roles
            .iter()
            .find(|r| r.id.as_str() == role_id)
            .map_or(role_id, |r| r.name.as_str())
    }

    fn tenant_name<'a>(&'a self, tenant_id: &'a str) -> &'a str {
        self.tenants
            .iter()
            .find(|t| t.id.as_str() == tenant_id)
            .map_or(tenant_id, |t| t.name.as_str())
    }
}

/// Render the snapshot as an indented, sectioned text report.
pub fn render_report(snapshot: &Snapshot) -> String {
    Report { snapshot }.to_string()
}

struct Report<'a> {
    snapshot: &'a Snapshot,
}

impl Report<'_> {
    fn tenant(
        &self,
        f: &mut fmt::Formatter<'_>,
        forest: &TenantForest,
        tenant: &Tenant,
        level: usize,
    ) -> fmt::Result {
        let s = self.snapshot;
        let indent = "  ".repeat(level);

        let grants: Vec<&TenantAccess> = s
            .tenant_accesses
            .iter()
            .filter(|a| a.tenant_id == tenant.id)
            .collect();
        let owned: Vec<&ResourceOwnership> = s
            .ownerships
            .iter()
            .filter(|o| o.tenant_id == tenant.id)
            .collect();

        writeln!(f, "{indent}- {} ({})", tenant.name, tenant.id)?;
        writeln!(f, "{indent}    {} account(s) with access", grants.len())?;
        for access in grants {
            writeln!(
                f,
                "{indent}      account {} as {}",
                access.account_id,
                s.role_name(access.role_id.as_str())
            )?;
        }
        writeln!(f, "{indent}    {} owned resource(s)", owned.len())?;
        for ownership in owned {
            writeln!(f, "{indent}      {}", ownership.resource)?;
        }

        for child in forest.children(&tenant.id) {
            self.tenant(f, forest, child, level + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.snapshot;
        let forest = TenantForest::from_tenants(s.tenants.iter().cloned());

        writeln!(f, "TENANT HIERARCHY")?;
        for root in forest.roots() {
            self.tenant(f, &forest, root, 0)?;
        }

        writeln!(f)?;
        writeln!(f, "ACCOUNTS")?;
        for account in &s.accounts {
            writeln!(
                f,
                "- {} ({})",
                account.name.as_deref().unwrap_or("unnamed"),
                account.id
            )?;
            writeln!(f, "    email: {}", account.email.as_deref().unwrap_or("-"))?;
            writeln!(
                f,
                "    organization: {}",
                account.organization.as_deref().unwrap_or("-")
            )?;

            let tenant_grants = s
                .tenant_accesses
                .iter()
                .filter(|a| a.account_id == account.id);
            for access in tenant_grants {
                writeln!(
                    f,
                    "    tenant {} as {}",
                    s.tenant_name(access.tenant_id.as_str()),
                    s.role_name(access.role_id.as_str())
                )?;
            }

            let resource_grants = s
                .resource_accesses
                .iter()
                .filter(|a| a.account_id == account.id);
            for access in resource_grants {
                writeln!(
                    f,
                    "    resource {} as {}",
                    access.resource,
                    s.role_name(access.role_id.as_str())
                )?;
            }
        }

        writeln!(f)?;
        writeln!(f, "ROLES")?;
        for role in &s.roles {
            let permissions: Vec<&str> = role.permissions.iter().map(String::as_str).collect();
            let resource_uses = s
                .resource_accesses
                .iter()
                .filter(|a| a.role_id == role.id)
                .count();
            let tenant_uses = s
                .tenant_accesses
                .iter()
                .filter(|a| a.role_id == role.id)
                .count();

            writeln!(f, "- {} ({})", role.name, role.id)?;
            if let Some(description) = &role.description {
                writeln!(f, "    {description}")?;
            }
            if permissions.is_empty() {
                writeln!(f, "    permissions: none")?;
            } else {
                writeln!(f, "    permissions: {}", permissions.join(", "))?;
            }
            writeln!(
                f,
                "    used by {resource_uses} resource grant(s), {tenant_uses} tenant grant(s)"
            )?;
        }

        writeln!(f)?;
        writeln!(f, "RESOURCES")?;
        for resource in &s.resources {
            writeln!(f, "- {}", resource.key)?;
            match s.ownerships.iter().find(|o| o.resource == resource.key) {
                Some(o) => writeln!(f, "    owned by {}", s.tenant_name(o.tenant_id.as_str()))?,
                None => writeln!(f, "    unowned")?,
            }
            for access in s
                .resource_accesses
                .iter()
                .filter(|a| a.resource == resource.key)
            {
                writeln!(
                    f,
                    "    account {} as {}",
                    access.account_id,
                    s.role_name(access.role_id.as_str())
                )?;
            }
        }

        Ok(())
    }
}
