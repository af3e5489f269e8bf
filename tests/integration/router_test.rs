//! HTTP round trips through the router

use crate::common::{body_json, json_request, memory_state, operation_json, test_router};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use futures_util::StreamExt;
use hubcollab::shared::ot::Operation;
use pretty_assertions::assert_eq;
use tokio::time::{timeout, Duration};
use tower::ServiceExt;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_put_then_snapshot() {
    let router = test_router(memory_state(100));

    let op = Operation::insert("alice", 0, 0, "hello");
    let response = router
        .clone()
        .oneshot(json_request(Method::PUT, "/collab/note", &operation_json("note", &op)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let applied = body_json(response).await;
    assert_eq!(applied["revision"], 1);
    assert_eq!(applied["kind"], "insert");
    assert_eq!(applied["text"], "hello");
    assert_eq!(applied["tieBreakKey"], "alice");

    let response = router.oneshot(get("/collab/note/snapshot")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let snapshot = body_json(response).await;
    assert_eq!(snapshot["content"], "hello");
    assert_eq!(snapshot["revision"], 1);
    assert_eq!(snapshot["documentId"], "note");
}

#[tokio::test]
async fn test_unknown_kind_is_unprocessable() {
    let router = test_router(memory_state(100));
    let mut body = operation_json("note", &Operation::insert("alice", 0, 0, "x"));
    body["kind"] = "replace".into();

    let response = router
        .oneshot(json_request(Method::PUT, "/collab/note", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let error = body_json(response).await;
    assert_eq!(error["kind"], "malformed_operation");
    assert_eq!(error["resync"], true);
}

#[tokio::test]
async fn test_negative_base_revision_is_unprocessable() {
    let router = test_router(memory_state(100));
    let mut body = operation_json("note", &Operation::insert("alice", 0, 0, "x"));
    body["baseRevision"] = (-1).into();

    let response = router
        .oneshot(json_request(Method::PUT, "/collab/note", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["kind"], "malformed_operation");
}

#[tokio::test]
async fn test_out_of_bounds_is_unprocessable() {
    let router = test_router(memory_state(100));
    let body = operation_json("note", &Operation::delete("alice", 0, 2, 4));

    let response = router
        .oneshot(json_request(Method::PUT, "/collab/note", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_document_mismatch_is_unprocessable() {
    let router = test_router(memory_state(100));
    let body = operation_json("other", &Operation::insert("alice", 0, 0, "x"));

    let response = router
        .oneshot(json_request(Method::PUT, "/collab/note", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_undecodable_body_is_bad_request() {
    let router = test_router(memory_state(100));
    let request = Request::builder()
        .method(Method::PUT)
        .uri("/collab/note")
        .body(Body::from("not json"))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_compacted_base_is_conflict() {
    let collab = memory_state(1);
    for i in 0..3 {
        collab
            .submit("note", &Operation::insert("alice", i, 0, "a"))
            .await
            .unwrap();
    }
    let router = test_router(collab);

    let stale = operation_json("note", &Operation::insert("bob", 0, 0, "b"));
    let response = router
        .oneshot(json_request(Method::PUT, "/collab/note", &stale))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let error = body_json(response).await;
    assert_eq!(error["kind"], "revision_too_old");
    assert_eq!(error["resync"], true);
}

#[tokio::test]
async fn test_ack_ahead_of_document_is_rejected() {
    let router = test_router(memory_state(100));
    let ack = serde_json::json!({ "authorId": "alice", "revision": 5 });

    let response = router
        .oneshot(json_request(Method::POST, "/collab/note/ack", &ack))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_ack_and_leave() {
    let collab = memory_state(100);
    collab
        .submit("note", &Operation::insert("alice", 0, 0, "x"))
        .await
        .unwrap();
    let router = test_router(collab);

    let ack = serde_json::json!({ "authorId": "alice", "revision": 1 });
    let response = router
        .clone()
        .oneshot(json_request(Method::POST, "/collab/note/ack", &ack))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let leave = Request::builder()
        .method(Method::DELETE)
        .uri("/collab/note/participants/alice")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(leave).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let again = Request::builder()
        .method(Method::DELETE)
        .uri("/collab/note/participants/alice")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(again).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_documents() {
    let collab = memory_state(100);
    collab.open("b").await.unwrap();
    collab.open("a").await.unwrap();
    let router = test_router(collab);

    let response = router.oneshot(get("/collab")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["documents"], serde_json::json!(["a", "b"]));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let router = test_router(memory_state(100));
    let response = router.oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_subscription_starts_with_snapshot() {
    let collab = memory_state(100);
    collab
        .submit("note", &Operation::insert("alice", 0, 0, "hi"))
        .await
        .unwrap();
    let router = test_router(collab.clone());

    let response = router
        .oneshot(get("/collab/note?author=bob"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    let mut body = response.into_body().into_data_stream();
    let first = timeout(Duration::from_secs(5), body.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let frame = String::from_utf8(first.to_vec()).unwrap();
    crate::assert_contains!(frame, "event: snapshot");
    crate::assert_contains!(frame, "\"content\":\"hi\"");

    let handle = collab.get("note").await.unwrap();
    assert_eq!(handle.participants().await, vec![("bob".to_string(), 1)]);
}

#[tokio::test]
async fn test_reconnect_survives_old_stream_teardown() {
    let collab = memory_state(100);
    let router = test_router(collab.clone());

    let old = router
        .clone()
        .oneshot(get("/collab/note?author=alice"))
        .await
        .unwrap();
    let new = router
        .clone()
        .oneshot(get("/collab/note?author=alice&since=0"))
        .await
        .unwrap();
    drop(old);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let handle = collab.get("note").await.unwrap();
    assert_eq!(handle.participants().await, vec![("alice".to_string(), 0)]);

    // another tab of the same author sees the submission
    let op = Operation::insert("alice", 0, 0, "hi");
    let response = router
        .oneshot(json_request(Method::PUT, "/collab/note", &operation_json("note", &op)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = new.into_body().into_data_stream();
    let mut frames = Vec::new();
    while !frames.iter().any(|frame: &String| frame.contains("event: operation")) {
        let chunk = timeout(Duration::from_secs(5), body.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        frames.push(String::from_utf8(chunk.to_vec()).unwrap());
    }
    crate::assert_contains!(frames.last().unwrap(), "\"text\":\"hi\"");

    drop(body);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(handle.participants().await.is_empty());
}

#[tokio::test]
async fn test_subscription_requires_author() {
    let router = test_router(memory_state(100));
    let response = router.oneshot(get("/collab/note?author=")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let router = test_router(memory_state(100));
    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
