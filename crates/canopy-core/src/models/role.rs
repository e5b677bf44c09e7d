//! Role domain model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::RoleId;

/// A named bundle of permissions.
///
/// Permissions are opaque tokens compared by exact, case-sensitive
/// equality. A role with no permissions grants nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl Role {
    pub fn new<I, P>(id: impl Into<RoleId>, name: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether this role carries `permission`.
    pub fn grants(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}
