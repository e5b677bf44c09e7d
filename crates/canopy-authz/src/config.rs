//! Authorization configuration.

/// Configuration for the [`Authorizer`](crate::Authorizer).
#[derive(Debug, Clone, Default)]
pub struct AuthzConfig {
    /// Optional ceiling on the number of tenants visited while walking
    /// from a resource's owner towards the root. Unset by default: the
    /// walk then only stops at a root, at a grant, or on a repeated
    /// tenant.
    pub max_hierarchy_depth: Option<usize>,
}

impl AuthzConfig {
    /// Read `CANOPY_MAX_HIERARCHY_DEPTH`. Unset, zero or unparsable
    /// values leave the walk uncapped.
    pub fn from_env() -> Self {
        let max_hierarchy_depth = std::env::var("CANOPY_MAX_HIERARCHY_DEPTH")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|depth| *depth > 0);
        Self {
            max_hierarchy_depth,
        }
    }
}
