use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use futures::future::BoxFuture;
use player_kv_back::{
    auth::{AuthError, TokenVerifier, VerifiedUser},
    config::AppConfig,
    dao::{
        kv_store::{KvStore, MemoryKvStore},
        storage::StorageResult,
    },
    routes,
    state::{AppState, SharedState},
};
use serde_json::{Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tower::ServiceExt;

/// Accepts `token-<sub>`, fails on `explode`, rejects everything else.
struct FakeAuthority;

impl TokenVerifier for FakeAuthority {
    fn verify(&self, token: String) -> BoxFuture<'static, Result<Option<VerifiedUser>, AuthError>> {
        Box::pin(async move {
            if token == "explode" {
                return Err(AuthError::UnexpectedStatus {
                    status: reqwest::StatusCode::BAD_GATEWAY,
                });
            }
            Ok(token
                .strip_prefix("token-")
                .map(|sub| VerifiedUser { sub: sub.to_owned() }))
        })
    }
}

/// Memory store that counts every operation it serves.
#[derive(Clone, Default)]
struct CountingStore {
    inner: MemoryKvStore,
    calls: Arc<AtomicUsize>,
}

impl CountingStore {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl KvStore for CountingStore {
    fn backend(&self) -> &'static str {
        "counting"
    }

    fn get(&self, key: String) -> BoxFuture<'static, StorageResult<Option<String>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key)
    }

    fn put(&self, key: String, value: String) -> BoxFuture<'static, StorageResult<()>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, value)
    }

    fn delete(&self, key: String) -> BoxFuture<'static, StorageResult<()>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.health_check()
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.try_reconnect()
    }
}

struct TestApp {
    router: Router,
    store: CountingStore,
    state: SharedState,
}

fn app() -> TestApp {
    let store = CountingStore::default();
    let state = AppState::with_store(
        AppConfig::default(),
        Arc::new(store.clone()),
        Arc::new(FakeAuthority),
    );
    TestApp {
        router: routes::router(state.clone()),
        store,
        state,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn json_body(value: Value) -> Option<String> {
    Some(value.to_string())
}

fn sample_save() -> Value {
    json!({
        "version": "1.4.0",
        "save_structure": "math-facts",
        "packs": {"addition": {"unlocked": true, "stars": 2}},
        "questions": {"3+4": [{"answer": 7, "ms": 1200}]},
        "sfx_volume": 0.7,
        "music_volume": 0.25,
        "drill_mode": {"high_score": 31}
    })
}

#[tokio::test]
async fn player_state_post_then_get() {
    let app = app();
    let before = OffsetDateTime::now_utc();

    let (status, body) = send(
        &app.router,
        request("POST", "/api/sample/kv", None, json_body(json!({"score": 42}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Player state saved successfully"));

    let (status, body) = send(&app.router, request("GET", "/api/sample/kv", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["score"], json!(42));
    assert_eq!(body["data"]["level"], json!(1));

    let stamped = body["data"]["lastPlayed"].as_str().unwrap();
    let stamped = OffsetDateTime::parse(stamped, &Rfc3339).unwrap();
    assert!(stamped >= before - Duration::from_millis(1));
    assert!(stamped - before < Duration::from_secs(5));
}

#[tokio::test]
async fn player_state_is_scoped_by_user_id() {
    let app = app();
    send(
        &app.router,
        request(
            "POST",
            "/api/sample/kv",
            None,
            json_body(json!({"score": 5, "level": 3, "userId": "alice"})),
        ),
    )
    .await;

    let (_, alice) = send(
        &app.router,
        request("GET", "/api/sample/kv?userId=alice", None, None),
    )
    .await;
    assert_eq!(alice["data"]["level"], json!(3));

    let (status, demo) = send(&app.router, request("GET", "/api/sample/kv", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        demo,
        json!({"success": true, "data": null, "message": "No saved state found"})
    );
}

#[tokio::test]
async fn repeated_user_id_uses_the_first_value() {
    let app = app();
    send(
        &app.router,
        request(
            "POST",
            "/api/sample/kv",
            None,
            json_body(json!({"score": 8, "userId": "a"})),
        ),
    )
    .await;

    let (status, body) = send(
        &app.router,
        request("GET", "/api/sample/kv?userId=a&userId=b", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["score"], json!(8));

    let (status, body) = send(
        &app.router,
        request("DELETE", "/api/sample/kv?userId=a&userId=b", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(app.store.inner.peek("user:a:state").is_none());
}

#[tokio::test]
async fn player_state_delete_is_idempotent() {
    let app = app();
    for _ in 0..2 {
        let (status, body) = send(
            &app.router,
            request("DELETE", "/api/sample/kv?userId=ghost", None, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"success": true, "message": "Player state cleared successfully"})
        );
    }
}

#[tokio::test]
async fn invalid_score_is_rejected_without_changing_state() {
    let app = app();
    send(
        &app.router,
        request("POST", "/api/sample/kv", None, json_body(json!({"score": 9}))),
    )
    .await;
    let stored = app.store.inner.peek("user:demo-user:state");

    for invalid in [json!({"score": -1}), json!({"score": "9"}), json!({"level": 2})] {
        let (status, body) = send(
            &app.router,
            request("POST", "/api/sample/kv", None, json_body(invalid)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"success": false, "error": "Invalid score value"}));
    }

    assert_eq!(app.store.inner.peek("user:demo-user:state"), stored);
}

#[tokio::test]
async fn non_numeric_level_is_rejected() {
    let app = app();
    let (status, body) = send(
        &app.router,
        request(
            "POST",
            "/api/sample/kv",
            None,
            json_body(json!({"score": 3, "level": "two"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "Invalid level value"}));
    assert!(app.store.inner.peek("user:demo-user:state").is_none());
}

#[tokio::test]
async fn malformed_player_state_body_is_internal_error() {
    let app = app();
    let (status, body) = send(
        &app.router,
        request("POST", "/api/sample/kv", None, Some("{\"score\":".into())),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Failed to save player state"));
    assert!(body["details"].as_str().unwrap().contains("malformed JSON body"));
}

#[tokio::test]
async fn save_routes_require_a_token() {
    let app = app();
    let cases = [
        request("GET", "/api/save", None, None),
        request("POST", "/api/save", None, json_body(sample_save())),
        request("DELETE", "/api/save", None, None),
        request("GET", "/api/save", Some("not-a-valid-token"), None),
    ];

    for case in cases {
        let (status, body) = send(&app.router, case).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"success": false, "error": "User not authenticated"}));
    }

    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn save_round_trips_for_authenticated_user() {
    let app = app();
    let (status, body) = send(
        &app.router,
        request("POST", "/api/save", Some("token-bob"), json_body(sample_save())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "message": "Save data stored successfully"})
    );
    assert!(app.store.inner.peek("user:bob:savedata").is_some());

    let (status, body) = send(
        &app.router,
        request("GET", "/api/save", Some("token-bob"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], sample_save());

    let (_, other) = send(
        &app.router,
        request("GET", "/api/save", Some("token-carol"), None),
    )
    .await;
    assert_eq!(
        other,
        json!({"success": true, "data": null, "message": "No saved data found"})
    );
}

#[tokio::test]
async fn invalid_save_keeps_previous_value() {
    let app = app();
    send(
        &app.router,
        request("POST", "/api/save", Some("token-bob"), json_body(sample_save())),
    )
    .await;
    let stored = app.store.inner.peek("user:bob:savedata");

    for invalid in [
        json!({"save_structure": "math-facts"}),
        json!({"version": "1.4.0", "save_structure": ""}),
    ] {
        let (status, body) = send(
            &app.router,
            request("POST", "/api/save", Some("token-bob"), json_body(invalid)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"success": false, "error": "Invalid save data structure"})
        );
    }

    assert_eq!(app.store.inner.peek("user:bob:savedata"), stored);
}

#[tokio::test]
async fn oversized_save_body_keeps_the_json_envelope() {
    let app = app();
    let padding = "x".repeat(3 * 1024 * 1024);
    let mut oversized = sample_save();
    oversized["padding"] = json!(padding);

    let (status, body) = send(
        &app.router,
        request("POST", "/api/save", Some("token-bob"), json_body(oversized)),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Failed to save data"));
    assert!(body["details"].as_str().unwrap().contains("request body"));
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn save_delete_resets_progress() {
    let app = app();
    send(
        &app.router,
        request("POST", "/api/save", Some("token-bob"), json_body(sample_save())),
    )
    .await;

    for _ in 0..2 {
        let (status, body) = send(
            &app.router,
            request("DELETE", "/api/save", Some("token-bob"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"success": true, "message": "Save data cleared successfully"})
        );
    }
    assert!(app.store.inner.peek("user:bob:savedata").is_none());
}

#[tokio::test]
async fn authority_failure_is_internal_error() {
    let app = app();
    let (status, body) = send(
        &app.router,
        request("GET", "/api/save", Some("explode"), None),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Failed to fetch save data"));
    assert!(body["details"].as_str().unwrap().contains("502"));
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn degraded_mode_reports_storage_failure() {
    let app = app();
    app.state.clear_kv_store().await;

    let (status, body) = send(
        &app.router,
        request("DELETE", "/api/save", Some("token-bob"), None),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({
            "success": false,
            "error": "Failed to clear save data",
            "details": "storage unavailable (degraded mode)"
        })
    );

    let (_, health) = send(&app.router, request("GET", "/healthcheck", None, None)).await;
    assert_eq!(health, json!({"status": "degraded"}));
}

#[tokio::test]
async fn healthcheck_reports_backend() {
    let app = app();
    let (status, body) = send(&app.router, request("GET", "/healthcheck", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "backend": "counting"}));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = app();
    let (status, body) = send(
        &app.router,
        request("GET", "/api-doc/openapi.json", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/save"].is_object());
}
