//! JSON seed documents.
//!
//! A seed describes a complete starting state: tenant trees, roles,
//! accounts, owned resources and grants. Applying it goes through the
//! same builder and administration calls a caller would use, so
//! collisions are counted rather than treated as failures.

use canopy_core::error::CanopyResult;
use canopy_core::ids::TenantId;
use canopy_core::models::{
    access::{CreateResourceAccess, CreateTenantAccess},
    account::Account,
    resource::{Resource, ResourceKey},
    role::Role,
    tenant::TenantNode,
};
use canopy_core::store::DataStore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::builder::TenantBuilder;
use crate::error::AuthzError;
use crate::resolver::Authorizer;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub tenants: Vec<TenantNode>,
    pub roles: Vec<Role>,
    pub accounts: Vec<Account>,
    pub resources: Vec<SeedResource>,
    pub resource_grants: Vec<CreateResourceAccess>,
    pub tenant_grants: Vec<CreateTenantAccess>,
}

/// A resource together with the tenant that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedResource {
    #[serde(flatten)]
    pub key: ResourceKey,
    pub owner: TenantId,
}

/// What applying a seed changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub tenants: usize,
    pub roles: usize,
    pub accounts: usize,
    pub resources: usize,
    pub grants: usize,
    /// Entries skipped because they already existed or referenced
    /// something missing.
    pub rejected: usize,
}

impl Seed {
    pub fn from_json(input: &str) -> Result<Self, AuthzError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Write the seed into the builder's store.
    ///
    /// Roles and accounts go first, then tenant trees, resources and
    /// grants. A tenant id that already exists aborts with
    /// [`CanopyError::CycleOrDuplicate`](canopy_core::CanopyError::CycleOrDuplicate),
    /// as it does for [`TenantBuilder::create_tenant_tree`]; every other
    /// collision is counted in [`SeedSummary::rejected`].
    pub async fn apply<S: DataStore>(
        &self,
        builder: &TenantBuilder<S>,
        authorizer: &Authorizer<S>,
    ) -> CanopyResult<SeedSummary> {
        let mut summary = SeedSummary::default();

        for role in &self.roles {
            match builder.add_role(role.clone()).await? {
                Some(_) => summary.roles += 1,
                None => summary.rejected += 1,
            }
        }

        for account in &self.accounts {
            match builder.add_account(account.clone()).await? {
                Some(_) => summary.accounts += 1,
                None => summary.rejected += 1,
            }
        }

        for tree in &self.tenants {
            summary.tenants += builder.create_tenant_tree(tree.clone()).await?.len();
        }

        for resource in &self.resources {
            let added = builder
                .add_resource(Resource::new(resource.key.clone()), &resource.owner)
                .await?;
            if added {
                summary.resources += 1;
            } else {
                summary.rejected += 1;
            }
        }

        for grant in &self.resource_grants {
            let granted = authorizer
                .grant_access(
                    grant.account_id.clone(),
                    grant.resource.clone(),
                    grant.role_id.clone(),
                )
                .await?;
            match granted {
                Some(_) => summary.grants += 1,
                None => summary.rejected += 1,
            }
        }

        for grant in &self.tenant_grants {
            let granted = authorizer
                .grant_tenant_access(
                    grant.account_id.clone(),
                    grant.tenant_id.clone(),
                    grant.role_id.clone(),
                )
                .await?;
            match granted {
                Some(_) => summary.grants += 1,
                None => summary.rejected += 1,
            }
        }

        info!(
            tenants = summary.tenants,
            roles = summary.roles,
            accounts = summary.accounts,
            resources = summary.resources,
            grants = summary.grants,
            rejected = summary.rejected,
            "Seed applied"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use canopy_core::{CanopyError, MemoryStore};

    use super::*;
    use crate::AuthzConfig;

    const RESTAURANT: &str = r#"{
        "tenants": [
            { "id": "saas", "name": "SaaS Platform", "children": [
                { "id": "chain", "name": "Restaurant Chain", "children": [
                    { "id": "branch", "name": "Downtown Branch" }
                ] }
            ] }
        ],
        "roles": [
            { "id": "server", "name": "Server", "permissions": ["take-orders", "serve-food"] }
        ],
        "accounts": [
            { "id": "john", "name": "John", "email": "john@example.com" }
        ],
        "resources": [
            { "id": "tablet", "type": "device", "owner": "chain" },
            { "id": "menu", "owner": "branch" },
            { "id": "ghost", "owner": "nowhere" }
        ],
        "resource_grants": [
            { "account_id": "john", "resource": { "id": "tablet", "type": "device" }, "role_id": "server" }
        ],
        "tenant_grants": [
            { "account_id": "john", "tenant_id": "branch", "role_id": "server" }
        ]
    }"#;

    fn setup() -> (TenantBuilder<MemoryStore>, Authorizer<MemoryStore>) {
        let store = MemoryStore::new();
        (
            TenantBuilder::new(store.clone()),
            Authorizer::new(store, AuthzConfig::default()),
        )
    }

    #[test]
    fn parses_missing_sections_as_empty() {
        let seed = Seed::from_json(r#"{ "roles": [] }"#).unwrap();
        assert_eq!(seed, Seed::default());
    }

    #[test]
    fn rejects_malformed_documents() {
        let err = Seed::from_json("{ \"tenants\": 3 }").unwrap_err();
        assert!(matches!(err, AuthzError::InvalidSeed(_)));
    }

    #[test]
    fn resources_without_type_stay_untyped() {
        let seed = Seed::from_json(RESTAURANT).unwrap();
        assert_eq!(seed.resources[1].key, ResourceKey::untyped("menu"));
        assert_eq!(seed.resources[0].key, ResourceKey::typed("tablet", "device"));
    }

    #[tokio::test]
    async fn apply_populates_the_store() {
        let (builder, authorizer) = setup();
        let seed = Seed::from_json(RESTAURANT).unwrap();

        let summary = seed.apply(&builder, &authorizer).await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                tenants: 3,
                roles: 1,
                accounts: 1,
                resources: 2,
                grants: 2,
                rejected: 1,
            }
        );

        let john = "john".into();
        assert!(
            authorizer
                .authorize(&john, &ResourceKey::typed("tablet", "device"), "serve-food")
                .await
                .unwrap()
        );
        assert!(
            authorizer
                .authorize(&john, &ResourceKey::untyped("menu"), "take-orders")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn applying_twice_aborts_on_existing_tenants() {
        let (builder, authorizer) = setup();
        let seed = Seed::from_json(RESTAURANT).unwrap();
        seed.apply(&builder, &authorizer).await.unwrap();

        let err = seed.apply(&builder, &authorizer).await.unwrap_err();
        assert!(matches!(err, CanopyError::CycleOrDuplicate { .. }));
    }
}
