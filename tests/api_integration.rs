//! Integration tests for the HTTP API
//!
//! Tests the session lifecycle over the router: create, select, stream
//! frames, read the summary

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use formfit::core::{create_router, ExerciseCatalog};
use formfit::types::{index, Landmark, LandmarkFrame};
use formfit::EngineConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn create_test_router() -> Router {
    create_router(EngineConfig::default(), Arc::new(ExerciseCatalog::builtin()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Standing pose, arms at the sides
fn standing_frame() -> LandmarkFrame {
    let mut frame = LandmarkFrame::default();
    for (idx, x, y) in [
        (index::LEFT_SHOULDER, 0.45, 0.3),
        (index::RIGHT_SHOULDER, 0.55, 0.3),
        (index::LEFT_HIP, 0.45, 0.55),
        (index::RIGHT_HIP, 0.55, 0.55),
        (index::LEFT_KNEE, 0.45, 0.72),
        (index::RIGHT_KNEE, 0.55, 0.72),
        (index::LEFT_ANKLE, 0.45, 0.9),
        (index::RIGHT_ANKLE, 0.55, 0.9),
    ] {
        frame.set(idx, Landmark::with_presence(x, y, 0.98));
    }
    frame
}

/// Health check reports version and catalog size
#[tokio::test]
async fn test_health() {
    let app = create_test_router();
    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], formfit::VERSION);
    assert_eq!(json["exercises"], 8);
    assert_eq!(json["sessions_active"], 0);
}

/// Exercise listing exposes the catalog
#[tokio::test]
async fn test_list_exercises() {
    let app = create_test_router();
    let (status, json) = send(&app, "GET", "/exercises", None).await;

    assert_eq!(status, StatusCode::OK);
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 8);
    let plank = list.iter().find(|e| e["id"] == "plank").unwrap();
    assert_eq!(plank["counts_reps"], false);
}

/// Sessions with and without an initial exercise
#[tokio::test]
async fn test_create_session() {
    let app = create_test_router();

    let (status, json) = send(&app, "POST", "/session/new", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let id = json["session_id"].as_str().unwrap();
    assert!(id.starts_with("session_"));
    assert_eq!(json["websocket_url"], format!("/ws/{}", id));
    assert!(json.get("exercise").is_none());
    assert_eq!(json["known"], false);

    let (_, json) = send(&app, "POST", "/session/new", Some(json!({"exercise": "squats"}))).await;
    assert_eq!(json["exercise"], "squat");
    assert_eq!(json["known"], true);

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["sessions_active"], 2);
}

/// Unknown sessions are 404 on every route
#[tokio::test]
async fn test_missing_session() {
    let app = create_test_router();

    let (status, _) = send(&app, "GET", "/session/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/session/nope/exercise",
        Some(json!({"exerciseId": "squat"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/session/nope/frame",
        Some(json!({"timestamp": 0.0})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Select, stream frames, read back the summary
#[tokio::test]
async fn test_session_flow() {
    let app = create_test_router();
    let (_, created) = send(&app, "POST", "/session/new", Some(json!({}))).await;
    let id = created["session_id"].as_str().unwrap().to_string();

    let (status, selected) = send(
        &app,
        "POST",
        &format!("/session/{}/exercise", id),
        Some(json!({"exerciseId": "Squat"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(selected["exercise"], "squat");
    assert_eq!(selected["known"], true);
    assert_eq!(selected["events"][0]["type"], "exercise_selected");
    assert_eq!(selected["events"][1]["type"], "speak");

    let frame = serde_json::to_value(standing_frame()).unwrap();
    let mut last = Value::Null;
    for i in 0..10 {
        let (status, outcome) = send(
            &app,
            "POST",
            &format!("/session/{}/frame", id),
            Some(json!({"timestamp": i as f64 * 0.1, "landmarks": frame})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["record"]["phase"], "STANDING");
        last = outcome;
    }
    assert_eq!(last["record"]["confirmedState"], "not_deep");
    assert_eq!(last["events"][0]["type"], "state_confirmed");

    let (_, lost) = send(
        &app,
        "POST",
        &format!("/session/{}/frame", id),
        Some(json!({"timestamp": 1.0})),
    )
    .await;
    assert_eq!(lost["record"]["detected"], false);

    let (status, summary) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["session_id"], id.as_str());
    assert_eq!(summary["exercise"], "squat");
    assert_eq!(summary["framesProcessed"], 11);
    assert_eq!(summary["repCount"], 0);
    assert_eq!(summary["confirmedState"], "not_deep");
}

/// Unknown exercise names are accepted and reported as unknown
#[tokio::test]
async fn test_select_unknown_exercise() {
    let app = create_test_router();
    let (_, created) = send(&app, "POST", "/session/new", Some(json!({"exercise": "squat"}))).await;
    let id = created["session_id"].as_str().unwrap().to_string();

    let (status, selected) = send(
        &app,
        "POST",
        &format!("/session/{}/exercise", id),
        Some(json!({"exerciseId": "handstand"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(selected["known"], false);
    assert_eq!(selected["events"].as_array().unwrap().len(), 1);

    let (_, summary) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert_eq!(summary["exercise"], "handstand");
    assert_eq!(summary["exerciseKnown"], false);
    assert_eq!(summary["repCount"], Value::Null);
}

/// Closing a session frees it; a second close is 404
#[tokio::test]
async fn test_delete_session() {
    let app = create_test_router();
    let (_, created) = send(&app, "POST", "/session/new", Some(json!({"exercise": "plank"}))).await;
    let id = created["session_id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "DELETE", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["sessions_active"], 0);

    let (status, _) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
