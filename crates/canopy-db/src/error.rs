//! Database-specific error types and conversions.

use canopy_core::error::CanopyError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),
}

impl From<DbError> for CanopyError {
    fn from(err: DbError) -> Self {
        CanopyError::Database(err.to_string())
    }
}
