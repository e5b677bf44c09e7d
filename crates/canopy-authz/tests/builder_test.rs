//! Tenant hierarchy construction.

use canopy_authz::TenantBuilder;
use canopy_core::models::{
    resource::{Resource, ResourceKey},
    tenant::{CreateTenant, TenantNode},
};
use canopy_core::{CanopyError, DataStore, MemoryStore, TenantId};

fn ids(tenants: &[canopy_core::models::tenant::Tenant]) -> Vec<&str> {
    tenants.iter().map(|t| t.id.as_str()).collect()
}

#[tokio::test]
async fn tree_is_created_parents_first_in_declared_order() {
    let builder = TenantBuilder::new(MemoryStore::new());

    let created = builder
        .create_tenant_tree(
            TenantNode::new("saas", "SaaS")
                .with_child(
                    TenantNode::new("chain", "Chain")
                        .with_child(TenantNode::new("downtown", "Downtown")),
                )
                .with_child(TenantNode::new("bakery", "Bakery")),
        )
        .await
        .unwrap();

    assert_eq!(ids(&created), ["saas", "chain", "downtown", "bakery"]);

    let downtown = builder
        .store()
        .get_tenant(&"downtown".into())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(downtown.parent_id, Some(TenantId::from("chain")));
    assert!(created[0].is_root());
}

#[tokio::test]
async fn existing_root_aborts_construction() {
    let builder = TenantBuilder::new(MemoryStore::new());
    builder
        .create_tenant_tree(TenantNode::new("saas", "SaaS"))
        .await
        .unwrap();

    let err = builder
        .create_tenant_tree(TenantNode::new("saas", "Again").with_child(TenantNode::new("x", "X")))
        .await
        .unwrap_err();
    match err {
        CanopyError::CycleOrDuplicate { tenant_id } => assert_eq!(tenant_id, "saas"),
        other => panic!("expected CycleOrDuplicate, got {other:?}"),
    }
    assert!(builder.store().get_tenant(&"x".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn repeated_id_inside_a_tree_aborts_and_keeps_earlier_tenants() {
    let builder = TenantBuilder::new(MemoryStore::new());

    let err = builder
        .create_tenant_tree(
            TenantNode::new("a", "A").with_child(
                TenantNode::new("b", "B")
                    .with_child(TenantNode::new("a", "A again"))
                    .with_child(TenantNode::new("c", "C")),
            ),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CanopyError::CycleOrDuplicate { .. }));

    let stored = builder.store().list_tenants().await.unwrap();
    assert_eq!(ids(&stored), ["a", "b"]);
    let a = builder.store().get_tenant(&"a".into()).await.unwrap().unwrap();
    assert_eq!(a.name, "A");
    assert!(a.is_root());
}

#[tokio::test]
async fn add_tenant_requires_an_existing_parent() {
    let builder = TenantBuilder::new(MemoryStore::new());
    builder
        .add_tenant(CreateTenant::root("saas", "SaaS"))
        .await
        .unwrap()
        .unwrap();

    assert!(
        builder
            .add_tenant(CreateTenant::child("orphan", "Orphan", "missing"))
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        builder
            .add_tenant(CreateTenant::child("chain", "Chain", "saas"))
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        builder
            .add_tenant(CreateTenant::root("chain", "Chain"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn add_resource_records_ownership_once() {
    let builder = TenantBuilder::new(MemoryStore::new());
    builder
        .create_tenant_tree(TenantNode::new("saas", "SaaS"))
        .await
        .unwrap();
    let key = ResourceKey::typed("tablet", "device");

    assert!(
        !builder
            .add_resource(Resource::new(key.clone()), &"nowhere".into())
            .await
            .unwrap()
    );
    assert!(builder.store().get_resource(&key).await.unwrap().is_none());

    assert!(
        builder
            .add_resource(Resource::new(key.clone()), &"saas".into())
            .await
            .unwrap()
    );
    assert!(
        !builder
            .add_resource(Resource::new(key.clone()), &"saas".into())
            .await
            .unwrap()
    );

    let ownership = builder.store().get_ownership(&key).await.unwrap().unwrap();
    assert_eq!(ownership.tenant_id, TenantId::from("saas"));
}

#[tokio::test]
async fn add_resource_attaches_an_unowned_resource() {
    let builder = TenantBuilder::new(MemoryStore::new());
    builder
        .create_tenant_tree(
            TenantNode::new("saas", "SaaS").with_child(TenantNode::new("chain", "Chain")),
        )
        .await
        .unwrap();
    let key = ResourceKey::typed("tablet", "device");
    builder
        .store()
        .create_resource(Resource::new(key.clone()))
        .await
        .unwrap()
        .unwrap();
    assert!(builder.store().get_ownership(&key).await.unwrap().is_none());

    assert!(
        builder
            .add_resource(Resource::new(key.clone()), &"chain".into())
            .await
            .unwrap()
    );
    let ownership = builder.store().get_ownership(&key).await.unwrap().unwrap();
    assert_eq!(ownership.tenant_id, TenantId::from("chain"));
    assert_eq!(builder.store().list_resources().await.unwrap().len(), 1);
}

#[tokio::test]
async fn add_resource_with_an_owner_writes_nothing() {
    let builder = TenantBuilder::new(MemoryStore::new());
    builder
        .create_tenant_tree(
            TenantNode::new("saas", "SaaS").with_child(TenantNode::new("chain", "Chain")),
        )
        .await
        .unwrap();
    let key = ResourceKey::typed("tablet", "device");
    assert!(
        builder
            .add_resource(Resource::new(key.clone()), &"saas".into())
            .await
            .unwrap()
    );

    assert!(
        !builder
            .add_resource(Resource::new(key.clone()), &"chain".into())
            .await
            .unwrap()
    );
    let ownership = builder.store().get_ownership(&key).await.unwrap().unwrap();
    assert_eq!(ownership.tenant_id, TenantId::from("saas"));
}

#[tokio::test]
async fn verify_hierarchy_detects_corruption() {
    let store = MemoryStore::new();
    let builder = TenantBuilder::new(store.clone());
    builder
        .create_tenant_tree(
            TenantNode::new("saas", "SaaS").with_child(TenantNode::new("chain", "Chain")),
        )
        .await
        .unwrap();

    let forest = builder.verify_hierarchy().await.unwrap();
    assert_eq!(forest.len(), 2);
    assert_eq!(forest.depth(&"chain".into()).unwrap(), 1);

    store
        .create_tenant(CreateTenant::child("loop-a", "Loop A", "loop-b"))
        .await
        .unwrap();
    store
        .create_tenant(CreateTenant::child("loop-b", "Loop B", "loop-a"))
        .await
        .unwrap();

    let err = builder.verify_hierarchy().await.unwrap_err();
    assert!(matches!(err, CanopyError::CorruptHierarchy { .. }));
}
