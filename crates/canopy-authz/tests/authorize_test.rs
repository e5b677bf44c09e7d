//! Authorization resolution over the in-memory store.
//!
//! The fixture is a restaurant platform:
//!
//! ```text
//! saas
//! └── chain
//!     ├── branch
//!     └── airport
//! ```
//!
//! The chain owns a device tablet, the branch owns its point of sale.

use canopy_authz::{AuthzConfig, Authorizer, TenantBuilder};
use canopy_core::models::{
    resource::{Resource, ResourceKey, ResourceOwnership},
    role::Role,
    tenant::{CreateTenant, TenantNode},
};
use canopy_core::{AccountId, CanopyError, DataStore, MemoryStore, RoleId, TenantId};

fn tablet() -> ResourceKey {
    ResourceKey::typed("tablet", "device")
}

fn pos() -> ResourceKey {
    ResourceKey::typed("branch-pos", "device")
}

struct Fixture {
    store: MemoryStore,
    authorizer: Authorizer<MemoryStore>,
}

impl Fixture {
    async fn allowed(&self, account: &str, resource: &ResourceKey, permission: &str) -> bool {
        self.authorizer
            .authorize(&AccountId::from(account), resource, permission)
            .await
            .unwrap()
    }
}

async fn restaurant() -> Fixture {
    let store = MemoryStore::new();
    let builder = TenantBuilder::new(store.clone());

    builder
        .create_tenant_tree(
            TenantNode::new("saas", "Restaurant SaaS Platform").with_child(
                TenantNode::new("chain", "Restaurant Chain HQ")
                    .with_child(TenantNode::new("branch", "Downtown Branch"))
                    .with_child(TenantNode::new("airport", "Airport Branch")),
            ),
        )
        .await
        .unwrap();

    for role in [
        Role::new("server", "Server", ["take-orders", "serve-food"]),
        Role::new("cook", "Cook", ["cook-food"]),
        Role::new("platform-admin", "Platform Admin", ["platform-admin", "manage-all-tenants"]),
        Role::new("manager", "Manager", ["take-orders", "serve-food", "cook-food"]),
        Role::new("nobody", "Nobody", Vec::<String>::new()),
    ] {
        builder.add_role(role).await.unwrap().unwrap();
    }

    assert!(
        builder
            .add_resource(Resource::new(tablet()), &"chain".into())
            .await
            .unwrap()
    );
    assert!(
        builder
            .add_resource(Resource::new(pos()), &"branch".into())
            .await
            .unwrap()
    );

    Fixture {
        authorizer: Authorizer::new(store.clone(), AuthzConfig::default()),
        store,
    }
}

#[tokio::test]
async fn server_on_tablet_until_revoked() {
    let fx = restaurant().await;
    let john = AccountId::from("john");
    fx.authorizer
        .grant_access(john.clone(), tablet(), "server".into())
        .await
        .unwrap()
        .unwrap();

    assert!(fx.allowed("john", &tablet(), "take-orders").await);
    assert!(!fx.allowed("john", &tablet(), "manage-finances").await);

    fx.authorizer
        .revoke_access(&john, &tablet())
        .await
        .unwrap()
        .unwrap();
    assert!(!fx.allowed("john", &tablet(), "take-orders").await);
}

#[tokio::test]
async fn direct_grant_authorizes_role_permissions_only() {
    let fx = restaurant().await;
    fx.authorizer
        .grant_access("john".into(), tablet(), "server".into())
        .await
        .unwrap()
        .unwrap();

    assert!(fx.allowed("john", &tablet(), "take-orders").await);
    assert!(fx.allowed("john", &tablet(), "serve-food").await);
    assert!(!fx.allowed("john", &tablet(), "cook-food").await);
    assert!(!fx.allowed("john", &pos(), "take-orders").await);
    assert!(!fx.allowed("mary", &tablet(), "take-orders").await);
}

#[tokio::test]
async fn platform_admin_on_root_reaches_branch_resources() {
    let fx = restaurant().await;
    fx.authorizer
        .grant_tenant_access("admin".into(), "saas".into(), "platform-admin".into())
        .await
        .unwrap()
        .unwrap();

    // branch -> chain -> saas
    assert!(fx.allowed("admin", &pos(), "platform-admin").await);
    assert!(!fx.allowed("admin", &pos(), "cook-food").await);
    assert!(fx.allowed("admin", &tablet(), "manage-all-tenants").await);
}

#[tokio::test]
async fn root_tenant_grant_covers_the_whole_subtree() {
    let fx = restaurant().await;
    fx.authorizer
        .grant_tenant_access("admin".into(), "saas".into(), "manager".into())
        .await
        .unwrap()
        .unwrap();

    assert!(fx.allowed("admin", &pos(), "cook-food").await);
    assert!(fx.allowed("admin", &tablet(), "take-orders").await);
}

#[tokio::test]
async fn tenant_grant_does_not_reach_siblings_or_ancestors() {
    let fx = restaurant().await;
    fx.authorizer
        .grant_tenant_access("ana".into(), "airport".into(), "server".into())
        .await
        .unwrap()
        .unwrap();

    assert!(!fx.allowed("ana", &pos(), "take-orders").await);
    assert!(!fx.allowed("ana", &tablet(), "take-orders").await);
}

#[tokio::test]
async fn resource_grant_takes_precedence_over_tenant_grant() {
    let fx = restaurant().await;
    fx.authorizer
        .grant_tenant_access("john".into(), "chain".into(), "manager".into())
        .await
        .unwrap()
        .unwrap();
    fx.authorizer
        .grant_access("john".into(), tablet(), "server".into())
        .await
        .unwrap()
        .unwrap();

    // The direct grant decides, even though the tenant grant would allow.
    assert!(!fx.allowed("john", &tablet(), "cook-food").await);
    assert!(fx.allowed("john", &pos(), "cook-food").await);
}

#[tokio::test]
async fn nearest_tenant_grant_wins() {
    let fx = restaurant().await;
    fx.authorizer
        .grant_tenant_access("john".into(), "saas".into(), "manager".into())
        .await
        .unwrap()
        .unwrap();
    fx.authorizer
        .grant_tenant_access("john".into(), "branch".into(), "server".into())
        .await
        .unwrap()
        .unwrap();

    assert!(!fx.allowed("john", &pos(), "cook-food").await);
    assert!(fx.allowed("john", &pos(), "serve-food").await);
    // The tablet is owned by the chain, so the branch grant is not on its path.
    assert!(fx.allowed("john", &tablet(), "cook-food").await);
}

#[tokio::test]
async fn duplicate_grant_keeps_the_original_role() {
    let fx = restaurant().await;
    fx.authorizer
        .grant_access("john".into(), tablet(), "server".into())
        .await
        .unwrap()
        .unwrap();

    let second = fx
        .authorizer
        .grant_access("john".into(), tablet(), "cook".into())
        .await
        .unwrap();
    assert!(second.is_none());
    assert!(!fx.allowed("john", &tablet(), "cook-food").await);
}

#[tokio::test]
async fn revoke_removes_direct_access() {
    let fx = restaurant().await;
    let john = AccountId::from("john");
    fx.authorizer
        .grant_access(john.clone(), tablet(), "server".into())
        .await
        .unwrap()
        .unwrap();

    let revoked = fx.authorizer.revoke_access(&john, &tablet()).await.unwrap();
    assert_eq!(revoked.map(|a| a.role_id), Some(RoleId::from("server")));
    assert!(!fx.allowed("john", &tablet(), "take-orders").await);

    assert!(fx.authorizer.revoke_access(&john, &tablet()).await.unwrap().is_none());
}

#[tokio::test]
async fn ownership_transfer_moves_tenant_derived_access() {
    let fx = restaurant().await;
    fx.authorizer
        .grant_tenant_access("ana".into(), "branch".into(), "server".into())
        .await
        .unwrap()
        .unwrap();
    assert!(fx.allowed("ana", &pos(), "take-orders").await);

    let moved = fx
        .authorizer
        .change_ownership(&pos(), &"airport".into())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.tenant_id, TenantId::from("airport"));
    assert!(!fx.allowed("ana", &pos(), "take-orders").await);

    let rejected = fx
        .authorizer
        .change_ownership(&pos(), &"nowhere".into())
        .await
        .unwrap();
    assert!(rejected.is_none());
}

#[tokio::test]
async fn untyped_key_does_not_match_typed_resource() {
    let fx = restaurant().await;
    fx.authorizer
        .grant_access("john".into(), ResourceKey::untyped("tablet"), "server".into())
        .await
        .unwrap()
        .unwrap();

    assert!(!fx.allowed("john", &tablet(), "take-orders").await);
    // The untyped grant stands on its own, but "tablet" without a type has
    // no owner, so only the direct grant can authorize it.
    assert!(fx.allowed("john", &ResourceKey::untyped("tablet"), "take-orders").await);
}

#[tokio::test]
async fn unowned_resource_is_denied_without_direct_grant() {
    let fx = restaurant().await;
    fx.authorizer
        .grant_tenant_access("admin".into(), "saas".into(), "platform-admin".into())
        .await
        .unwrap()
        .unwrap();

    let stray = ResourceKey::typed("stray", "device");
    assert!(!fx.allowed("admin", &stray, "take-orders").await);
}

#[tokio::test]
async fn empty_role_and_missing_role_grant_nothing() {
    let fx = restaurant().await;
    fx.authorizer
        .grant_access("john".into(), tablet(), "nobody".into())
        .await
        .unwrap()
        .unwrap();
    fx.authorizer
        .grant_access("mary".into(), tablet(), "ghost-role".into())
        .await
        .unwrap()
        .unwrap();

    assert!(!fx.allowed("john", &tablet(), "take-orders").await);
    assert!(!fx.allowed("mary", &tablet(), "take-orders").await);
}

#[tokio::test]
async fn role_changes_apply_to_existing_grants() {
    let store = MemoryStore::new();
    let builder = TenantBuilder::new(store.clone());
    builder
        .create_tenant_tree(TenantNode::new("saas", "SaaS"))
        .await
        .unwrap();
    builder
        .add_resource(Resource::new(tablet()), &"saas".into())
        .await
        .unwrap();

    let authorizer = Authorizer::new(store.clone(), AuthzConfig::default());
    authorizer
        .grant_access("john".into(), tablet(), "late".into())
        .await
        .unwrap()
        .unwrap();
    assert!(
        !authorizer
            .authorize(&"john".into(), &tablet(), "take-orders")
            .await
            .unwrap()
    );

    // The grant was recorded before the role existed; it resolves on read.
    builder
        .add_role(Role::new("late", "Late", ["take-orders"]))
        .await
        .unwrap()
        .unwrap();
    assert!(
        authorizer
            .authorize(&"john".into(), &tablet(), "take-orders")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn cyclic_hierarchy_is_reported_not_looped() {
    let store = MemoryStore::new();
    for (id, parent) in [("a", "c"), ("b", "a"), ("c", "b")] {
        store
            .create_tenant(CreateTenant::child(id, id, parent))
            .await
            .unwrap()
            .unwrap();
    }
    store
        .create_resource(Resource::new(tablet()))
        .await
        .unwrap()
        .unwrap();
    store
        .create_ownership(ResourceOwnership {
            resource: tablet(),
            tenant_id: "a".into(),
        })
        .await
        .unwrap()
        .unwrap();

    let authorizer = Authorizer::new(store, AuthzConfig::default());
    let err = authorizer
        .authorize(&"john".into(), &tablet(), "take-orders")
        .await
        .unwrap_err();
    assert!(matches!(err, CanopyError::CorruptHierarchy { .. }));
}

#[tokio::test]
async fn deep_hierarchy_resolves_without_a_ceiling() {
    let store = MemoryStore::new();
    store
        .create_tenant(CreateTenant::root("t0", "t0"))
        .await
        .unwrap()
        .unwrap();
    for i in 1..70 {
        let (id, parent) = (format!("t{i}"), format!("t{}", i - 1));
        store
            .create_tenant(CreateTenant::child(id.as_str(), id.as_str(), parent))
            .await
            .unwrap()
            .unwrap();
    }

    let builder = TenantBuilder::new(store.clone());
    builder
        .add_role(Role::new("reader", "Reader", ["read"]))
        .await
        .unwrap()
        .unwrap();
    let doc = ResourceKey::typed("doc", "file");
    assert!(
        builder
            .add_resource(Resource::new(doc.clone()), &"t69".into())
            .await
            .unwrap()
    );
    builder.verify_hierarchy().await.unwrap();

    let authorizer = Authorizer::new(store, AuthzConfig::default());
    authorizer
        .grant_tenant_access("ana".into(), "t0".into(), "reader".into())
        .await
        .unwrap()
        .unwrap();

    assert!(
        authorizer
            .authorize(&"ana".into(), &doc, "read")
            .await
            .unwrap()
    );
    assert!(
        !authorizer
            .authorize(&"bob".into(), &doc, "read")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn configured_depth_limit_counts_the_owner() {
    let fx = restaurant().await;
    fx.authorizer
        .grant_tenant_access("admin".into(), "saas".into(), "manager".into())
        .await
        .unwrap()
        .unwrap();

    // branch -> chain -> saas visits three tenants.
    let tight = Authorizer::new(
        fx.store.clone(),
        AuthzConfig {
            max_hierarchy_depth: Some(3),
        },
    );
    assert!(
        tight
            .authorize(&"admin".into(), &pos(), "cook-food")
            .await
            .unwrap()
    );

    let too_tight = Authorizer::new(
        fx.store.clone(),
        AuthzConfig {
            max_hierarchy_depth: Some(2),
        },
    );
    let err = too_tight
        .authorize(&"admin".into(), &pos(), "cook-food")
        .await
        .unwrap_err();
    assert!(matches!(err, CanopyError::CorruptHierarchy { .. }));
}

#[tokio::test]
async fn resources_of_lists_direct_grants_by_exact_type() {
    let fx = restaurant().await;
    let john = AccountId::from("john");
    fx.authorizer
        .grant_access(john.clone(), tablet(), "server".into())
        .await
        .unwrap()
        .unwrap();
    fx.authorizer
        .grant_tenant_access(john.clone(), "branch".into(), "server".into())
        .await
        .unwrap()
        .unwrap();

    let device = "device".into();
    let devices = fx
        .authorizer
        .get_resources_of(&john, Some(&device))
        .await
        .unwrap();
    // branch-pos is reachable through the tenant grant but is not listed.
    assert_eq!(devices, vec![Resource::new(tablet())]);

    let untyped = fx.authorizer.get_resources_of(&john, None).await.unwrap();
    assert!(untyped.is_empty());
}
