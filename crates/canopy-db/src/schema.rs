//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! Identifiers are stored as strings with a UNIQUE index per store
//! key. An untyped resource carries an empty `resource_type`.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct AppliedVersion {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenants (flat; the forest is the parent_id relation)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE tenant TYPE string;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD parent_id ON TABLE tenant TYPE option<string>;
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_id ON TABLE tenant COLUMNS tenant_id UNIQUE;
DEFINE INDEX idx_tenant_parent ON TABLE tenant COLUMNS parent_id;

-- =======================================================================
-- Roles
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD role_id ON TABLE role TYPE string;
DEFINE FIELD name ON TABLE role TYPE string;
DEFINE FIELD description ON TABLE role TYPE option<string>;
DEFINE FIELD permissions ON TABLE role TYPE array<string> DEFAULT [];
DEFINE INDEX idx_role_id ON TABLE role COLUMNS role_id UNIQUE;

-- =======================================================================
-- Resources (keyed by id + type; '' is the untyped marker)
-- =======================================================================
DEFINE TABLE resource SCHEMAFULL;
DEFINE FIELD resource_id ON TABLE resource TYPE string;
DEFINE FIELD resource_type ON TABLE resource TYPE string DEFAULT '';
DEFINE INDEX idx_resource_key ON TABLE resource \
    COLUMNS resource_id, resource_type UNIQUE;

DEFINE TABLE resource_ownership SCHEMAFULL;
DEFINE FIELD resource_id ON TABLE resource_ownership TYPE string;
DEFINE FIELD resource_type ON TABLE resource_ownership TYPE string \
    DEFAULT '';
DEFINE FIELD tenant_id ON TABLE resource_ownership TYPE string;
DEFINE INDEX idx_ownership_key ON TABLE resource_ownership \
    COLUMNS resource_id, resource_type UNIQUE;
DEFINE INDEX idx_ownership_tenant ON TABLE resource_ownership \
    COLUMNS tenant_id;

-- =======================================================================
-- Access grants
-- =======================================================================
DEFINE TABLE resource_access SCHEMAFULL;
DEFINE FIELD account_id ON TABLE resource_access TYPE string;
DEFINE FIELD resource_id ON TABLE resource_access TYPE string;
DEFINE FIELD resource_type ON TABLE resource_access TYPE string \
    DEFAULT '';
DEFINE FIELD role_id ON TABLE resource_access TYPE string;
DEFINE FIELD granted_at ON TABLE resource_access TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_resource_access_key ON TABLE resource_access \
    COLUMNS account_id, resource_id, resource_type UNIQUE;

DEFINE TABLE tenant_access SCHEMAFULL;
DEFINE FIELD account_id ON TABLE tenant_access TYPE string;
DEFINE FIELD tenant_id ON TABLE tenant_access TYPE string;
DEFINE FIELD role_id ON TABLE tenant_access TYPE string;
DEFINE FIELD granted_at ON TABLE tenant_access TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_access_key ON TABLE tenant_access \
    COLUMNS account_id, tenant_id UNIQUE;

-- =======================================================================
-- Accounts
-- =======================================================================
DEFINE TABLE account SCHEMAFULL;
DEFINE FIELD account_id ON TABLE account TYPE string;
DEFINE FIELD name ON TABLE account TYPE option<string>;
DEFINE FIELD email ON TABLE account TYPE option<string>;
DEFINE FIELD organization ON TABLE account TYPE option<string>;
DEFINE INDEX idx_account_id ON TABLE account COLUMNS account_id UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Bring the database schema up to date.
///
/// The `_migration` table records every applied version; only versions
/// above the highest recorded one are run.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current = current_version(db).await?;
    let pending = MIGRATIONS.iter().filter(|m| m.version > current);

    for migration in pending {
        apply(db, migration).await?;
    }

    Ok(())
}

async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let applied: Vec<AppliedVersion> = result.take(0)?;
    Ok(applied.first().map_or(0, |m| m.version))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    info!(
        version = migration.version,
        name = migration.name,
        "Applying migration"
    );

    db.query(migration.sql).await?.check().map_err(|e| {
        DbError::Migration(format!(
            "v{} '{}': {e}",
            migration.version, migration.name
        ))
    })?;

    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!("recording v{}: {e}", migration.version))
        })?;

    Ok(())
}
