//! Nightfall — snapshot persistence.
//!
//! Two implementations of `SnapshotRepository`: a PostgreSQL table keyed by
//! session and version, and an in-process store for running without a
//! database.

pub mod in_memory;
pub mod pg_snapshot_repository;

/// Applies the bundled migrations to `pool`.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
