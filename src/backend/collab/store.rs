/**
 * Snapshot Stores
 *
 * The persistence collaborator of the collaborative editing core. A store
 * supplies the `(content, revision)` snapshot when a document session opens,
 * is told about every applied operation, and receives full snapshots when a
 * session is flushed.
 *
 * Loading rolls the latest snapshot forward through the operations recorded
 * after it, so a document survives a restart even if the last snapshot is
 * stale.
 *
 * # Implementations
 *
 * - `MemorySnapshotStore` - process-local, used by default and in tests
 * - `SqliteSnapshotStore` - SQLite via sqlx, selected by `DATABASE_URL`
 */

use crate::backend::error::BackendError;
use crate::shared::message::AppliedMessage;
use crate::shared::ot::{AppliedOperation, DocumentSnapshot};
use futures_util::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::RwLock;

/// Persistence collaborator for document sessions
pub trait SnapshotStore: Send + Sync {
    /// Latest known state of a document, or `None` if it was never stored
    fn load<'a>(&'a self, document_id: &'a str)
        -> BoxFuture<'a, Result<Option<DocumentSnapshot>, BackendError>>;

    /// Record an applied operation
    fn record<'a>(
        &'a self,
        document_id: &'a str,
        applied: &'a AppliedOperation,
    ) -> BoxFuture<'a, Result<(), BackendError>>;

    /// Store a full snapshot; recorded operations it covers may be discarded
    fn save_snapshot<'a>(&'a self, snapshot: &'a DocumentSnapshot)
        -> BoxFuture<'a, Result<(), BackendError>>;
}

#[derive(Debug, Default)]
struct StoredDocument {
    snapshot: Option<DocumentSnapshot>,
    operations: Vec<AppliedOperation>,
}

/// Process-local snapshot store
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    documents: RwLock<HashMap<String, StoredDocument>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded operations not yet covered by a snapshot
    pub async fn pending_operations(&self, document_id: &str) -> usize {
        let docs = self.documents.read().await;
        docs.get(document_id).map(|doc| doc.operations.len()).unwrap_or(0)
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load<'a>(&'a self, document_id: &'a str)
        -> BoxFuture<'a, Result<Option<DocumentSnapshot>, BackendError>> {
        Box::pin(async move {
            let docs = self.documents.read().await;
            let Some(stored) = docs.get(document_id) else {
                return Ok(None);
            };
            let base = stored
                .snapshot
                .clone()
                .unwrap_or_else(|| DocumentSnapshot::empty(document_id));
            Ok(Some(base.replay(&stored.operations)?))
        })
    }

    fn record<'a>(
        &'a self,
        document_id: &'a str,
        applied: &'a AppliedOperation,
    ) -> BoxFuture<'a, Result<(), BackendError>> {
        Box::pin(async move {
            let mut docs = self.documents.write().await;
            docs.entry(document_id.to_string())
                .or_default()
                .operations
                .push(applied.clone());
            Ok(())
        })
    }

    fn save_snapshot<'a>(&'a self, snapshot: &'a DocumentSnapshot)
        -> BoxFuture<'a, Result<(), BackendError>> {
        Box::pin(async move {
            let mut docs = self.documents.write().await;
            let stored = docs.entry(snapshot.document_id.clone()).or_default();
            stored.operations.retain(|op| op.revision > snapshot.revision);
            stored.snapshot = Some(snapshot.clone());
            Ok(())
        })
    }
}

/// SQLite-backed snapshot store
#[derive(Debug, Clone)]
pub struct SqliteSnapshotStore {
    pool: SqlitePool,
}

impl SqliteSnapshotStore {
    /// Open (creating if missing) the database at `database_url` and
    /// initialise the schema
    pub async fn connect(database_url: &str) -> Result<Self, BackendError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // every connection to an in-memory database is a separate database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        tracing::info!("[Store] SQLite snapshot store ready at {}", database_url);
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<(), BackendError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS document_snapshots (
                document_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                revision INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS document_operations (
                document_id TEXT NOT NULL,
                revision INTEGER NOT NULL,
                payload TEXT NOT NULL,
                applied_at TEXT NOT NULL,
                PRIMARY KEY (document_id, revision)
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn load<'a>(&'a self, document_id: &'a str)
        -> BoxFuture<'a, Result<Option<DocumentSnapshot>, BackendError>> {
        Box::pin(async move {
            let row: Option<(String, i64)> = sqlx::query_as(
                "SELECT content, revision FROM document_snapshots WHERE document_id = ?",
            )
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await?;

            let base = match &row {
                Some((content, revision)) => DocumentSnapshot {
                    document_id: document_id.to_string(),
                    content: content.clone(),
                    revision: *revision as u64,
                },
                None => DocumentSnapshot::empty(document_id),
            };

            let payloads: Vec<(String,)> = sqlx::query_as(
                "SELECT payload FROM document_operations
                 WHERE document_id = ? AND revision > ?
                 ORDER BY revision",
            )
            .bind(document_id)
            .bind(base.revision as i64)
            .fetch_all(&self.pool)
            .await?;

            if row.is_none() && payloads.is_empty() {
                return Ok(None);
            }

            let operations = payloads
                .iter()
                .map(|(payload,)| -> Result<AppliedOperation, BackendError> {
                    let message: AppliedMessage = serde_json::from_str(payload)?;
                    Ok(message.to_applied()?)
                })
                .collect::<Result<Vec<_>, _>>()?;

            tracing::debug!(
                "[Store] Loaded {} at revision {} with {} recorded operations",
                document_id,
                base.revision,
                operations.len()
            );
            Ok(Some(base.replay(&operations)?))
        })
    }

    fn record<'a>(
        &'a self,
        document_id: &'a str,
        applied: &'a AppliedOperation,
    ) -> BoxFuture<'a, Result<(), BackendError>> {
        Box::pin(async move {
            let payload = serde_json::to_string(&AppliedMessage::from_applied(document_id, applied))?;
            sqlx::query(
                "INSERT OR REPLACE INTO document_operations (document_id, revision, payload, applied_at)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(document_id)
            .bind(applied.revision as i64)
            .bind(payload)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
            Ok(())
        })
    }

    fn save_snapshot<'a>(&'a self, snapshot: &'a DocumentSnapshot)
        -> BoxFuture<'a, Result<(), BackendError>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;

            sqlx::query(
                "INSERT INTO document_snapshots (document_id, content, revision, updated_at)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(document_id) DO UPDATE SET
                    content = excluded.content,
                    revision = excluded.revision,
                    updated_at = excluded.updated_at",
            )
            .bind(&snapshot.document_id)
            .bind(&snapshot.content)
            .bind(snapshot.revision as i64)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await?;

            sqlx::query("DELETE FROM document_operations WHERE document_id = ? AND revision <= ?")
                .bind(&snapshot.document_id)
                .bind(snapshot.revision as i64)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            tracing::debug!(
                "[Store] Saved snapshot of {} at revision {}",
                snapshot.document_id,
                snapshot.revision
            );
            Ok(())
        })
    }
}
