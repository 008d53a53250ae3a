//! Officer record storage backends
//!
//! The store is the boundary to the external record keeping: the manager
//! only ever calls `get` and `patch`. Patches are compare-and-swap on the
//! record's `version`; a mismatch means another request won the race and
//! surfaces as [`Error::Conflict`] instead of silently dropping a write.
//!
//! `MemoryOfficerStore` backs tests and development; `SqliteOfficerStore`
//! is the default persistent backend.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::roster::OfficerRecord;

/// Fields the management endpoint is allowed to write
///
/// Only the roster fields plus the legacy projection and the expected
/// version; identity and anything else on the record stays untouched.
#[derive(Debug, Clone)]
pub struct RosterPatch {
    /// New membership set
    pub memberships: Vec<String>,
    /// New rank set (insertion-ordered)
    pub ranks: Vec<String>,
    /// Recomputed legacy projection
    pub primary_rank: Option<String>,
    /// Version the caller read; the patch applies only if it still matches
    pub expected_version: i64,
}

impl RosterPatch {
    /// Build a patch from a mutated record, CAS-guarded by the version the
    /// record had when it was read
    #[must_use]
    pub fn from_record(record: &OfficerRecord, expected_version: i64) -> Self {
        Self {
            memberships: record.memberships.clone(),
            ranks: record.ranks.clone(),
            primary_rank: record.primary_rank.clone(),
            expected_version,
        }
    }
}

/// Officer record store
#[async_trait]
pub trait OfficerStore: Send + Sync {
    /// Fetch a record by officer id
    async fn get(&self, officer_id: &str) -> Result<Option<OfficerRecord>>;

    /// Insert or replace a whole record (provisioning, tests)
    async fn put(&self, record: &OfficerRecord) -> Result<()>;

    /// Apply a roster patch with a version check
    ///
    /// Returns the record's new version. `Error::Conflict` when the stored
    /// version no longer matches, `Error::NotFound` when the officer does
    /// not exist.
    async fn patch(&self, officer_id: &str, patch: &RosterPatch) -> Result<i64>;

    /// All records holding membership in the given unit
    async fn members_of(&self, unit_id: &str) -> Result<Vec<OfficerRecord>>;

    /// Total number of stored records
    async fn count(&self) -> Result<usize>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-memory officer store (development and tests; nothing survives restart)
#[derive(Default)]
pub struct MemoryOfficerStore {
    records: RwLock<HashMap<String, OfficerRecord>>,
}

impl MemoryOfficerStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OfficerStore for MemoryOfficerStore {
    async fn get(&self, officer_id: &str) -> Result<Option<OfficerRecord>> {
        Ok(self.records.read().await.get(officer_id).cloned())
    }

    async fn put(&self, record: &OfficerRecord) -> Result<()> {
        self.records.write().await.insert(record.officer_id.clone(), record.clone());
        Ok(())
    }

    async fn patch(&self, officer_id: &str, patch: &RosterPatch) -> Result<i64> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(officer_id)
            .ok_or_else(|| Error::NotFound(format!("officer '{officer_id}'")))?;

        if record.version != patch.expected_version {
            return Err(Error::Conflict);
        }

        record.memberships = patch.memberships.clone();
        record.ranks = patch.ranks.clone();
        record.primary_rank = patch.primary_rank.clone();
        record.version += 1;
        record.updated_at = Utc::now();

        debug!(officer_id = %officer_id, version = record.version, "record patched in memory");
        Ok(record.version)
    }

    async fn members_of(&self, unit_id: &str) -> Result<Vec<OfficerRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.memberships.iter().any(|m| m == unit_id))
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}

// ============================================================================
// SQLite store
// ============================================================================

/// SQLite officer store, the default persistent backend
pub struct SqliteOfficerStore {
    pool: SqlitePool,
}

impl SqliteOfficerStore {
    /// Open (and create if missing) the database at `path`
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Store(format!("failed to create database directory: {e}")))?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| Error::Store(format!("invalid sqlite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::Store(format!("failed to connect to sqlite: {e}")))?;

        let store = Self { pool };
        store.init_schema().await?;

        info!(path = %path.display(), "sqlite officer store initialized");
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS officers (
                officer_id TEXT PRIMARY KEY,
                memberships TEXT NOT NULL,
                ranks TEXT NOT NULL,
                primary_rank TEXT,
                version INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Store(format!("failed to create officers table: {e}")))?;

        debug!("sqlite officer schema initialized");
        Ok(())
    }

    fn decode_row(row: &sqlx::sqlite::SqliteRow) -> Result<OfficerRecord> {
        let memberships: String = row.get("memberships");
        let ranks: String = row.get("ranks");
        let updated_at: String = row.get("updated_at");

        Ok(OfficerRecord {
            officer_id: row.get("officer_id"),
            memberships: serde_json::from_str(&memberships)
                .map_err(|e| Error::Store(format!("corrupt memberships column: {e}")))?,
            ranks: serde_json::from_str(&ranks)
                .map_err(|e| Error::Store(format!("corrupt ranks column: {e}")))?,
            primary_rank: row.get("primary_rank"),
            version: row.get("version"),
            updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at)
                .map_err(|e| Error::Store(format!("corrupt updated_at column: {e}")))?
                .with_timezone(&Utc),
        })
    }
}

#[async_trait]
impl OfficerStore for SqliteOfficerStore {
    async fn get(&self, officer_id: &str) -> Result<Option<OfficerRecord>> {
        let row = sqlx::query("SELECT * FROM officers WHERE officer_id = ?")
            .bind(officer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Store(format!("failed to get officer: {e}")))?;

        row.as_ref().map(Self::decode_row).transpose()
    }

    async fn put(&self, record: &OfficerRecord) -> Result<()> {
        let memberships = serde_json::to_string(&record.memberships)
            .map_err(|e| Error::Store(format!("failed to serialize memberships: {e}")))?;
        let ranks = serde_json::to_string(&record.ranks)
            .map_err(|e| Error::Store(format!("failed to serialize ranks: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO officers (officer_id, memberships, ranks, primary_rank, version, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(officer_id) DO UPDATE SET
                memberships = excluded.memberships,
                ranks = excluded.ranks,
                primary_rank = excluded.primary_rank,
                version = excluded.version,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.officer_id)
        .bind(&memberships)
        .bind(&ranks)
        .bind(&record.primary_rank)
        .bind(record.version)
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Store(format!("failed to put officer: {e}")))?;

        Ok(())
    }

    async fn patch(&self, officer_id: &str, patch: &RosterPatch) -> Result<i64> {
        let memberships = serde_json::to_string(&patch.memberships)
            .map_err(|e| Error::Store(format!("failed to serialize memberships: {e}")))?;
        let ranks = serde_json::to_string(&patch.ranks)
            .map_err(|e| Error::Store(format!("failed to serialize ranks: {e}")))?;
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            UPDATE officers
            SET memberships = ?, ranks = ?, primary_rank = ?,
                version = version + 1, updated_at = ?
            WHERE officer_id = ? AND version = ?
            "#,
        )
        .bind(&memberships)
        .bind(&ranks)
        .bind(&patch.primary_rank)
        .bind(&now)
        .bind(officer_id)
        .bind(patch.expected_version)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Store(format!("failed to patch officer: {e}")))?;

        if result.rows_affected() == 0 {
            // Distinguish a lost race from a missing record.
            return match self.get(officer_id).await? {
                Some(_) => Err(Error::Conflict),
                None => Err(Error::NotFound(format!("officer '{officer_id}'"))),
            };
        }

        let new_version = patch.expected_version + 1;
        debug!(officer_id = %officer_id, version = new_version, "record patched in sqlite");
        Ok(new_version)
    }

    async fn members_of(&self, unit_id: &str) -> Result<Vec<OfficerRecord>> {
        // Membership sets are tiny; filter the JSON columns in process.
        let rows = sqlx::query("SELECT * FROM officers")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Store(format!("failed to list officers: {e}")))?;

        let mut members = Vec::new();
        for row in &rows {
            let record = Self::decode_row(row)?;
            if record.memberships.iter().any(|m| m == unit_id) {
                members.push(record);
            }
        }
        Ok(members)
    }

    async fn count(&self) -> Result<usize> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM officers")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Store(format!("failed to count officers: {e}")))?;
        Ok(row.0 as usize)
    }
}
