//! Session coordinator behaviour under concurrency

use crate::common::{assert_contiguous, memory_state};
use hubcollab::backend::BackendError;
use hubcollab::shared::ot::Operation;
use hubcollab::shared::{CollabError, EventType};
use pretty_assertions::assert_eq;
use tokio::time::{timeout, Duration};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submits_are_serialized() {
    let state = memory_state(1000);
    let handle = state.open("note").await.unwrap();
    let mut rx = handle.subscribe();

    let tasks: Vec<_> = (0..50)
        .map(|i| {
            let state = state.clone();
            tokio::spawn(async move {
                let op = Operation::insert(format!("author-{}", i), 0, 0, "x");
                state.submit("note", &op).await
            })
        })
        .collect();
    for task in tasks {
        crate::assert_ok!(task.await.unwrap());
    }

    let snapshot = state.snapshot("note").await.unwrap();
    assert_eq!(snapshot.revision, 50);
    assert_eq!(snapshot.content, "x".repeat(50));

    let mut revisions = Vec::new();
    while revisions.len() < 50 {
        let event = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        if event.event_type == EventType::Operation {
            revisions.push(event.revision);
        }
    }
    assert_contiguous(&revisions, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_documents_are_independent() {
    let state = memory_state(100);

    let tasks: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .flat_map(|doc| {
            let state = state.clone();
            (0..10).map(move |i| {
                let state = state.clone();
                tokio::spawn(async move {
                    state
                        .submit(doc, &Operation::insert("writer", 0, 0, i.to_string()))
                        .await
                })
            })
        })
        .collect();
    for task in tasks {
        crate::assert_ok!(task.await.unwrap());
    }

    for doc in ["a", "b", "c"] {
        assert_eq!(state.snapshot(doc).await.unwrap().revision, 10);
    }
    assert_eq!(state.list_documents().await, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_scenario_interleaved_participants() {
    let state = memory_state(100);
    state
        .submit("note", &Operation::insert("seed", 0, 0, "hello"))
        .await
        .unwrap();

    // both saw revision 1
    let delete = Operation::delete("alice", 1, 0, 5);
    let insert = Operation::insert("bob", 1, 2, "Z");

    let applied_delete = state.submit("note", &delete).await.unwrap();
    let applied_insert = state.submit("note", &insert).await.unwrap();

    assert_eq!(applied_delete.applied().revision, 2);
    assert_eq!(applied_insert.applied().revision, 3);
    assert_eq!(applied_insert.applied().operation.position(), 0);
    assert_eq!(state.snapshot("note").await.unwrap().content, "Z");
}

#[tokio::test]
async fn test_duplicate_resend_returns_original_revision() {
    let state = memory_state(100);
    let op = Operation::insert("alice", 0, 0, "once");

    let first = state.submit("note", &op).await.unwrap();
    let second = state.submit("note", &op).await.unwrap();

    assert!(!first.is_duplicate());
    assert!(second.is_duplicate());
    assert_eq!(second.applied(), first.applied());
    assert_eq!(state.snapshot("note").await.unwrap().revision, 1);
}

#[tokio::test]
async fn test_rejected_operation_is_not_broadcast() {
    let state = memory_state(100);
    let handle = state.open("note").await.unwrap();
    let mut rx = handle.subscribe();

    let result = state.submit("note", &Operation::delete("alice", 0, 0, 3)).await;
    crate::assert_err!(result, BackendError::Collab(CollabError::MalformedOperation { .. }));

    assert!(rx.try_recv().is_err());
    assert_eq!(state.snapshot("note").await.unwrap().revision, 0);
}

#[tokio::test]
async fn test_acknowledgements_drive_compaction() {
    let state = memory_state(1);
    let handle = state.open("note").await.unwrap();
    let alice = handle.join("alice", Some(0)).await.unwrap();
    let bob = handle.join("bob", Some(0)).await.unwrap();

    for i in 0..4 {
        state
            .submit("note", &Operation::insert("alice", i, i as usize, "a"))
            .await
            .unwrap();
    }

    // bob has acknowledged nothing, so everything is retained
    let replay = handle.catch_up("bob", 0).await.unwrap();
    assert_eq!(replay.len(), 4);

    state.acknowledge("note", "alice", 4).await.unwrap();
    state.acknowledge("note", "bob", 3).await.unwrap();

    let too_old = state
        .submit("note", &Operation::insert("bob", 1, 0, "late"))
        .await;
    crate::assert_err!(too_old, BackendError::Collab(CollabError::RevisionTooOld { oldest: 3, .. }));

    // a lagging reader that fell behind compaction gets a snapshot
    let resync = handle.catch_up("bob", 1).await.unwrap();
    assert_eq!(resync.len(), 1);
    assert_eq!(resync[0].event_type, EventType::Snapshot);

    drop((alice, bob));
}

#[tokio::test]
async fn test_leave_broadcasts_and_releases_history() {
    let state = memory_state(1);
    let handle = state.open("note").await.unwrap();
    let joined = handle.join("alice", Some(0)).await.unwrap();
    let mut rx = joined.receiver;

    state
        .submit("note", &Operation::insert("bob", 0, 0, "a"))
        .await
        .unwrap();
    state
        .submit("note", &Operation::insert("bob", 1, 1, "b"))
        .await
        .unwrap();

    assert!(state.leave("note", "alice").await);
    assert!(!state.leave("note", "alice").await);

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(event.event_type);
    }
    assert_eq!(
        kinds,
        vec![EventType::Joined, EventType::Operation, EventType::Operation, EventType::Left]
    );

    // only the retention floor remains once nobody holds history back
    let resync = handle.catch_up("alice", 0).await.unwrap();
    assert_eq!(resync[0].event_type, EventType::Snapshot);
}
