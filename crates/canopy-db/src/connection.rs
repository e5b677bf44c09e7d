//! Connection to the SurrealDB server that backs [`SurrealStore`].
//!
//! The server binary connects once at startup and hands out store
//! handles that share the one client.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::store::SurrealStore;

/// Where the tenant, grant and ownership tables live.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Server address for the WebSocket engine, `host:port`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root credentials; migrations define tables and indexes.
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "canopy".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Build a configuration from `CANOPY_DB_*` environment variables,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str, fallback: String| std::env::var(name).unwrap_or(fallback);
        Self {
            url: var("CANOPY_DB_URL", defaults.url),
            namespace: var("CANOPY_DB_NAMESPACE", defaults.namespace),
            database: var("CANOPY_DB_DATABASE", defaults.database),
            username: var("CANOPY_DB_USERNAME", defaults.username),
            password: var("CANOPY_DB_PASSWORD", defaults.password),
        }
    }
}

/// An authenticated client with the Canopy namespace and database selected.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Sign in as root and select `config.namespace`/`config.database`.
    ///
    /// Migrations are not run here; call
    /// [`run_migrations`](crate::run_migrations) on [`Self::client`].
    pub async fn connect(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!(namespace = %config.namespace, "Store connection ready");

        Ok(Self { db })
    }

    /// The raw client, for migrations.
    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }

    /// A [`SurrealStore`] sharing this connection.
    pub fn store(&self) -> SurrealStore<Client> {
        SurrealStore::new(self.db.clone())
    }
}
