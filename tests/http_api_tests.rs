#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode, header},
};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use school_planner::{
    KeyValueStore, MemoryStore, Mood, PlannerSession, SchoolDay, StorageError, StorageResult,
    default_subjects,
    http_api::{self, ActionResponse, StateSnapshot},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

/// Memory store that can be switched to reject every write.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::other("disk full")));
        }
        self.inner.set(key, value)
    }
}

fn new_router() -> axum::Router {
    let session = PlannerSession::open_at(Box::new(MemoryStore::new()), "2025-03-10")
        .expect("open session");
    http_api::router(http_api::AppState::new(session))
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn send_action(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> ActionResponse {
    let (status, bytes) = send(app, method, uri, body).await;
    assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&bytes));
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_and_initial_state() {
    let app = new_router();
    let (status, bytes) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], json!("ok"));

    let (status, bytes) = send(&app, "GET", "/state", None).await;
    assert_eq!(status, StatusCode::OK);
    let state: StateSnapshot = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(state.subjects, default_subjects());
    assert!(state.timetable.is_empty());
    assert_eq!(state.selected_day, "2025-03-10");
    assert!(state.todos.is_empty());
}

#[tokio::test]
async fn todo_lifecycle_via_http_api() {
    let app = new_router();

    let response = send_action(&app, "POST", "/todos", Some(json!({ "text": "Math HW" }))).await;
    assert_eq!(response.state.todos.len(), 1);
    assert!(!response.state.todos[0].done);

    let response = send_action(&app, "POST", "/todos/0/toggle", None).await;
    assert!(response.state.todos[0].done);

    // Out-of-range indices leave the list alone.
    let response = send_action(&app, "POST", "/todos/5/toggle", None).await;
    assert_eq!(response.state.todos.len(), 1);

    let response = send_action(&app, "DELETE", "/todos/0", None).await;
    assert!(response.state.todos.is_empty());

    let (status, bytes) = send(&app, "GET", "/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    let todos: Vec<Value> = serde_json::from_slice(&bytes).unwrap();
    assert!(todos.is_empty());
}

#[tokio::test]
async fn set_lesson_and_reset_timetable() {
    let app = new_router();

    let response = send_action(
        &app,
        "PUT",
        "/timetable/Luni/0",
        Some(json!({ "text": "Fizică" })),
    )
    .await;
    assert_eq!(
        response.state.timetable.lesson(SchoolDay::Monday, 0),
        Some("Fizică")
    );

    let response = send_action(&app, "POST", "/timetable/reset", Some(json!({}))).await;
    assert_eq!(
        response.state.timetable.lesson(SchoolDay::Monday, 0),
        Some("Fizică"),
        "reset without confirmation is ignored"
    );

    let response = send_action(
        &app,
        "POST",
        "/timetable/reset",
        Some(json!({ "confirm": true })),
    )
    .await;
    assert!(response.state.timetable.is_empty());

    send_action(&app, "POST", "/timetable/example", None).await;
    let (_, bytes) = send(&app, "GET", "/timetable", None).await;
    let timetable: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(timetable["Miercuri"][6], json!("Dirigenţie"));
}

#[tokio::test]
async fn editable_fields_are_saved_per_day() {
    let app = new_router();

    let response = send_action(
        &app,
        "PUT",
        "/editable",
        Some(json!({ "priorities": ["Quiz"], "notes": "Lab coat", "mood": "bine" })),
    )
    .await;
    assert_eq!(response.state.editable.priorities[0], "Quiz");
    assert!(response.state.planners.is_empty(), "edits are unsaved");

    let response = send_action(&app, "POST", "/planner/save", None).await;
    assert_eq!(response.notice.as_deref(), Some("Planner saved for 2025-03-10"));
    let plan = &response.state.planners["2025-03-10"];
    assert_eq!(plan.notes, "Lab coat");
    assert_eq!(plan.mood, Some(Mood::Good));

    let response = send_action(
        &app,
        "PUT",
        "/selected-day",
        Some(json!({ "day": "2025-03-11" })),
    )
    .await;
    assert_eq!(response.state.selected_day, "2025-03-11");
    assert_eq!(response.state.editable.notes, "");

    let response = send_action(
        &app,
        "PUT",
        "/selected-day",
        Some(json!({ "day": "2025-03-10" })),
    )
    .await;
    assert_eq!(response.state.editable.notes, "Lab coat");

    let response = send_action(&app, "POST", "/editable/clear", None).await;
    assert_eq!(response.state.editable.notes, "");
    assert_eq!(response.state.planners["2025-03-10"].notes, "Lab coat");
}

#[tokio::test]
async fn editable_rejects_unknown_mood_and_extra_priorities() {
    let app = new_router();

    let (status, bytes) = send(&app, "PUT", "/editable", Some(json!({ "mood": "grumpy" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], json!("invalid_request"));

    let (status, _) = send(
        &app,
        "PUT",
        "/editable",
        Some(json!({ "priorities": ["a", "b", "c", "d"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn subjects_can_be_listed_and_added() {
    let app = new_router();
    let response = send_action(&app, "POST", "/subjects", Some(json!({ "label": " Robotică " }))).await;
    assert_eq!(response.state.subjects.last().map(String::as_str), Some("Robotică"));

    let (_, bytes) = send(&app, "GET", "/subjects", None).await;
    let subjects: Vec<String> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(subjects.len(), default_subjects().len() + 1);
}

#[tokio::test]
async fn export_and_import_via_http_api() {
    let app = new_router();
    send_action(&app, "POST", "/timetable/example", None).await;
    send_action(&app, "POST", "/todos", Some(json!({ "text": "Pack bag" }))).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/export").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("school-planner.json"), "{disposition}");
    let exported = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let other = new_router();
    let response = other
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/import")
                .body(Body::from(exported))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let imported: ActionResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(imported.notice.as_deref(), Some("Data imported successfully"));
    assert_eq!(imported.state.todos[0].text, "Pack bag");
    assert_eq!(
        imported.state.timetable.lesson(SchoolDay::Monday, 0),
        Some("Limba română")
    );
}

#[tokio::test]
async fn malformed_import_is_rejected_and_state_kept() {
    let app = new_router();
    send_action(&app, "POST", "/subjects", Some(json!({ "label": "Latină" }))).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/import")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], json!("invalid_import"));

    let (_, bytes) = send(&app, "GET", "/state", None).await;
    let state: StateSnapshot = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(state.subjects.last().map(String::as_str), Some("Latină"));
}

#[tokio::test]
async fn storage_failure_maps_to_server_error() {
    let store = Arc::new(FlakyStore::default());
    let session = PlannerSession::open_at(Box::new(store.clone()), "2025-03-10")
        .expect("open session");
    let shared = Arc::new(RwLock::new(session));
    let app = http_api::router(http_api::AppState::with_shared(shared.clone()));

    store.fail_writes.store(true, Ordering::SeqCst);
    let (status, bytes) = send(&app, "POST", "/todos", Some(json!({ "text": "Lost?" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], json!("storage_error"));
    assert!(body["message"].as_str().unwrap().contains("disk full"));

    // The change stays in memory even though it was not written.
    assert_eq!(shared.read().state().todos()[0].text, "Lost?");

    // Reads and no-op edits still succeed.
    let (status, _) = send(&app, "GET", "/state", None).await;
    assert_eq!(status, StatusCode::OK);
    send_action(&app, "PUT", "/editable", Some(json!({ "notes": "draft" }))).await;
}
