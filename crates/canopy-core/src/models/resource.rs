//! Resource and resource ownership domain models.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{ResourceId, ResourceType, TenantId};

/// Identity of a resource: its id together with its optional type.
///
/// A missing type is a distinct key value, not a wildcard: a grant
/// recorded without a type never matches a lookup that names one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    pub id: ResourceId,
    #[serde(default, rename = "type")]
    pub resource_type: Option<ResourceType>,
}

impl ResourceKey {
    pub fn new(id: impl Into<ResourceId>, resource_type: Option<ResourceType>) -> Self {
        Self {
            id: id.into(),
            resource_type,
        }
    }

    pub fn untyped(id: impl Into<ResourceId>) -> Self {
        Self::new(id, None)
    }

    pub fn typed(id: impl Into<ResourceId>, resource_type: impl Into<ResourceType>) -> Self {
        Self::new(id, Some(resource_type.into()))
    }

    /// The type tag as stored by backends that have no optional column:
    /// an empty string stands for "no type".
    pub fn type_str(&self) -> &str {
        self.resource_type.as_ref().map_or("", ResourceType::as_str)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resource_type {
            Some(t) => write!(f, "{t}/{}", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Any governed object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(flatten)]
    pub key: ResourceKey,
}

impl Resource {
    pub fn new(key: ResourceKey) -> Self {
        Self { key }
    }

    pub fn id(&self) -> &ResourceId {
        &self.key.id
    }

    pub fn resource_type(&self) -> Option<&ResourceType> {
        self.key.resource_type.as_ref()
    }
}

/// Binds one resource to the tenant that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOwnership {
    pub resource: ResourceKey,
    pub tenant_id: TenantId,
}
