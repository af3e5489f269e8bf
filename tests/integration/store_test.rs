//! Snapshot store persistence across restarts

use hubcollab::backend::collab::{CollabState, SnapshotStore, SqliteSnapshotStore};
use hubcollab::shared::ot::{DocumentSnapshot, Operation};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn database_url(dir: &tempfile::TempDir) -> String {
    format!("sqlite://{}", dir.path().join("notes.db").display())
}

#[tokio::test]
async fn test_sqlite_documents_survive_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = SqliteSnapshotStore::connect(&database_url(&dir)).await.unwrap();
        let state = CollabState::new(Arc::new(store), 64, 10);
        state
            .submit("note", &Operation::insert("alice", 0, 0, "hello world"))
            .await
            .unwrap();
        state
            .submit("note", &Operation::delete("bob", 1, 5, 6))
            .await
            .unwrap();
    }

    let store = SqliteSnapshotStore::connect(&database_url(&dir)).await.unwrap();
    let state = CollabState::new(Arc::new(store), 64, 10);
    let snapshot = state.snapshot("note").await.unwrap();
    assert_eq!(snapshot.content, "hello");
    assert_eq!(snapshot.revision, 2);

    // history starts at the loaded revision
    let stale = state
        .submit("note", &Operation::insert("carol", 1, 0, "x"))
        .await;
    assert!(stale.is_err());
    state
        .submit("note", &Operation::insert("carol", 2, 5, "!"))
        .await
        .unwrap();
    assert_eq!(state.snapshot("note").await.unwrap().content, "hello!");
}

#[tokio::test]
async fn test_close_idle_writes_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteSnapshotStore::connect(&database_url(&dir)).await.unwrap());
    let state = CollabState::new(store.clone(), 64, 10);

    state
        .submit("note", &Operation::insert("alice", 0, 0, "draft"))
        .await
        .unwrap();
    assert_eq!(state.close_idle().await, 1);

    let operations: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM document_operations")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(operations.0, 0);

    let loaded = store.load("note").await.unwrap().unwrap();
    assert_eq!(
        loaded,
        DocumentSnapshot {
            document_id: "note".into(),
            content: "draft".into(),
            revision: 1,
        }
    );
}

#[tokio::test]
async fn test_unknown_document_loads_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteSnapshotStore::connect(&database_url(&dir)).await.unwrap();
    assert!(store.load("missing").await.unwrap().is_none());
}
