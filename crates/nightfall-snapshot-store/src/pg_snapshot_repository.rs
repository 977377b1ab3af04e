//! `PostgreSQL` implementation of the `SnapshotRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use nightfall_core::error::DomainError;
use nightfall_core::snapshot::{SnapshotRepository, StoredSnapshot};

const INSERT_SNAPSHOT: &str = r"
INSERT INTO game_snapshots (session_id, version, payload, saved_at)
VALUES ($1, $2, $3, $4)
ON CONFLICT (session_id, version)
DO UPDATE SET payload = EXCLUDED.payload, saved_at = EXCLUDED.saved_at
";

const PRUNE_OLDER: &str = r"
DELETE FROM game_snapshots
WHERE session_id = $1 AND version < $2
";

const SELECT_LATEST: &str = r"
SELECT session_id, version, payload, saved_at
FROM game_snapshots
ORDER BY saved_at DESC, version DESC
LIMIT 1
";

type SnapshotRow = (Uuid, i64, serde_json::Value, DateTime<Utc>);

fn infrastructure(action: &str, err: &sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("{action} failed: {err}"))
}

/// PostgreSQL-backed snapshot repository.
#[derive(Debug, Clone)]
pub struct PgSnapshotRepository {
    pool: PgPool,
}

impl PgSnapshotRepository {
    /// Creates a new `PgSnapshotRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotRepository for PgSnapshotRepository {
    /// Writes the snapshot and drops the session's older versions in one
    /// transaction, so each session keeps a single row.
    async fn save(&self, session_id: Uuid, snapshot: &StoredSnapshot) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| infrastructure("snapshot transaction", &e))?;
        sqlx::query(INSERT_SNAPSHOT)
            .bind(session_id)
            .bind(snapshot.version)
            .bind(&snapshot.payload)
            .bind(snapshot.saved_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| infrastructure("snapshot insert", &e))?;
        let pruned = sqlx::query(PRUNE_OLDER)
            .bind(session_id)
            .bind(snapshot.version)
            .execute(&mut *tx)
            .await
            .map_err(|e| infrastructure("snapshot prune", &e))?
            .rows_affected();
        tx.commit()
            .await
            .map_err(|e| infrastructure("snapshot commit", &e))?;
        debug!(%session_id, version = snapshot.version, pruned, "snapshot saved");
        Ok(())
    }

    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, DomainError> {
        let row: Option<SnapshotRow> = sqlx::query_as(SELECT_LATEST)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| infrastructure("snapshot load", &e))?;
        Ok(
            row.map(|(session_id, version, payload, saved_at)| StoredSnapshot {
                session_id,
                version,
                payload,
                saved_at,
            }),
        )
    }
}
