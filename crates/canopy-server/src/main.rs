//! Canopy Server — application entry point.
//!
//! Connects to SurrealDB, brings the schema up to date, optionally applies
//! a JSON seed, checks the stored tenant hierarchy and prints a report of
//! everything in the store.

mod config;

use std::process::ExitCode;

use canopy_authz::{Authorizer, Seed, Snapshot, TenantBuilder, render_report};
use canopy_core::{CanopyError, CanopyResult};
use canopy_db::{DbError, DbManager};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();

    info!("Starting Canopy server...");

    match run(ServerConfig::from_env()).await {
        Ok(()) => {
            info!("Canopy server stopped.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Canopy server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig) -> CanopyResult<()> {
    let manager = DbManager::connect(&config.db)
        .await
        .map_err(DbError::from)?;
    canopy_db::run_migrations(manager.client()).await?;

    let store = manager.store();
    let builder = TenantBuilder::new(store.clone());
    let authorizer = Authorizer::new(store, config.authz);

    if let Some(path) = &config.seed_path {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CanopyError::Internal(format!("cannot read seed {}: {e}", path.display()))
        })?;
        let summary = Seed::from_json(&raw)?.apply(&builder, &authorizer).await?;
        info!(path = %path.display(), ?summary, "Seed loaded");
    }

    let forest = builder.verify_hierarchy().await?;
    info!(tenants = forest.len(), "Tenant hierarchy verified");

    let snapshot = Snapshot::capture(builder.store()).await?;
    println!("{}", render_report(&snapshot));
    Ok(())
}
