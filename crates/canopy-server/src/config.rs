//! Server configuration, read from `CANOPY_*` environment variables.

use std::path::PathBuf;

use canopy_authz::AuthzConfig;
use canopy_db::DbConfig;

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub authz: AuthzConfig,
    /// JSON seed applied at startup (`CANOPY_SEED`).
    pub seed_path: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            db: DbConfig::from_env(),
            authz: AuthzConfig::from_env(),
            seed_path: std::env::var_os("CANOPY_SEED").map(PathBuf::from),
        }
    }
}
