use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use thiserror::Error;

/// Connectivity or query failure from the backing store.
///
/// "Not found" is never an error; `exists` reports absence as `Ok(false)`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Persistent seen-cache, addressed by (namespace, fingerprint).
///
/// The contract is a plain existence check plus an insert, rather than
/// insert-if-absent, to stay store-agnostic. The check-then-act sequence this
/// leaves at the classifier layer is deliberate; see the classifier for the
/// race it tolerates.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Whether a live (unexpired) record exists for this fingerprint.
    async fn exists(&self, namespace: &str, fingerprint: &str) -> Result<bool, StoreError>;

    /// Record a newly-seen item. First-seen wins: inserting a fingerprint
    /// that already has a live record is a no-op, never an error. On success
    /// the record is durably visible to subsequent `exists` calls.
    async fn insert(
        &self,
        namespace: &str,
        fingerprint: &str,
        payload: &str,
        expires_at: i64,
    ) -> Result<(), StoreError>;
}

// ============================================================================
// SQLite implementation
// ============================================================================

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open the store and run migrations. `path` may be `:memory:` for tests.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let url = format!("sqlite:{}?mode=rwc", path);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seen_items (
                namespace TEXT NOT NULL,
                fingerprint TEXT NOT NULL,
                payload TEXT NOT NULL,
                inserted_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                PRIMARY KEY (namespace, fingerprint)
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_seen_items_expires ON seen_items(expires_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete expired records in a namespace, returning the count evicted.
    ///
    /// Housekeeping only; `exists` already ignores expired rows, so eviction
    /// timing never affects dedup decisions.
    pub async fn evict_expired(&self, namespace: &str) -> Result<u64, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query("DELETE FROM seen_items WHERE namespace = ? AND expires_at <= ?")
            .bind(namespace)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl DedupStore for SqliteStore {
    async fn exists(&self, namespace: &str, fingerprint: &str) -> Result<bool, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM seen_items WHERE namespace = ? AND fingerprint = ? AND expires_at > ?",
        )
        .bind(namespace)
        .bind(fingerprint)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn insert(
        &self,
        namespace: &str,
        fingerprint: &str,
        payload: &str,
        expires_at: i64,
    ) -> Result<(), StoreError> {
        let now = chrono::Utc::now().timestamp();
        // First-seen-wins for live rows: a duplicate insert is a no-op, not a
        // constraint violation. An expired row no longer counts as seen, so it
        // must not shadow the new record — refresh it in place, as a store
        // with its own TTL reaper would have deleted it already.
        sqlx::query(
            r#"
            INSERT INTO seen_items (namespace, fingerprint, payload, inserted_at, expires_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(namespace, fingerprint) DO UPDATE SET
                payload = excluded.payload,
                inserted_at = excluded.inserted_at,
                expires_at = excluded.expires_at
            WHERE seen_items.expires_at <= excluded.inserted_at
        "#,
        )
        .bind(namespace)
        .bind(fingerprint)
        .bind(payload)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
