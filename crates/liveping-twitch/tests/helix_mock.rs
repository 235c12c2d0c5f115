//! TwitchClient against a local stand-in for the OAuth and Helix endpoints.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use liveping_core::{AdapterError, StatusSource};
use liveping_twitch::TwitchClient;

#[derive(Default)]
struct MockHelix {
    token_requests: AtomicUsize,
    /// Number of upcoming stream requests that answer 401.
    reject_next: AtomicUsize,
    /// Token responses claim an absurd lifetime.
    huge_ttl: AtomicBool,
}

async fn token(State(state): State<Arc<MockHelix>>) -> Json<serde_json::Value> {
    let n = state.token_requests.fetch_add(1, Ordering::SeqCst) + 1;
    let expires_in = if state.huge_ttl.load(Ordering::SeqCst) {
        i64::MAX
    } else {
        5000000
    };
    Json(json!({
        "access_token": format!("token-{}", n),
        "expires_in": expires_in,
        "token_type": "bearer"
    }))
}

async fn streams(
    State(state): State<Arc<MockHelix>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if state
        .reject_next
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
    {
        return (StatusCode::UNAUTHORIZED, "invalid oauth token").into_response();
    }

    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer token-"));
    let has_client_id = headers.get("client-id").is_some();
    if !authorized || !has_client_id {
        return (StatusCode::BAD_REQUEST, "missing headers").into_response();
    }

    match query.get("user_login").map(String::as_str) {
        Some("livestreamer") => Json(json!({
            "data": [{
                "id": "314",
                "user_login": "livestreamer",
                "game_name": "Art",
                "title": "painting",
                "viewer_count": 12,
                "started_at": "2024-05-01T18:00:00Z",
                "thumbnail_url": "https://cdn.example/live-{width}x{height}.jpg"
            }]
        }))
        .into_response(),
        Some("broken") => (StatusCode::INTERNAL_SERVER_ERROR, "upstream down").into_response(),
        _ => Json(json!({ "data": [] })).into_response(),
    }
}

async fn spawn_mock() -> (String, Arc<MockHelix>) {
    let state = Arc::new(MockHelix::default());
    let app = Router::new()
        .route("/oauth2/token", post(token))
        .route("/helix/streams", get(streams))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), state)
}

fn client(base: &str) -> TwitchClient {
    TwitchClient::new("client-id", "secret")
        .unwrap()
        .with_base_urls(base, base)
}

#[tokio::test]
async fn test_live_and_offline() {
    let (base, state) = spawn_mock().await;
    let client = client(&base);

    let status = client.poll("LiveStreamer").await.unwrap();
    assert!(status.is_live);
    let session = status.session.unwrap();
    assert_eq!(session.id.as_str(), "314");
    assert_eq!(session.title, "painting");
    assert_eq!(
        session.thumbnail_url.as_deref(),
        Some("https://cdn.example/live-1280x720.jpg")
    );

    let status = client.poll("someoneelse").await.unwrap();
    assert!(!status.is_live);

    // Token cached across polls.
    assert_eq!(state.token_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unauthorized_drops_token() {
    let (base, state) = spawn_mock().await;
    let client = client(&base);

    client.poll("livestreamer").await.unwrap();
    state.reject_next.store(1, Ordering::SeqCst);

    let err = client.poll("livestreamer").await.unwrap_err();
    assert!(err.is_unauthorized());

    client.poll("livestreamer").await.unwrap();
    assert_eq!(state.token_requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_huge_token_lifetime_is_accepted() {
    let (base, state) = spawn_mock().await;
    state.huge_ttl.store(true, Ordering::SeqCst);
    let client = client(&base);

    assert!(client.poll("livestreamer").await.unwrap().is_live);
    assert!(!client.poll("someoneelse").await.unwrap().is_live);
    assert_eq!(state.token_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_server_error_maps_to_http() {
    let (base, _state) = spawn_mock().await;
    let client = client(&base);

    let err = client.poll("broken").await.unwrap_err();
    match err {
        AdapterError::Http { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream down");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unreachable_host_is_auth_failure() {
    // Nothing listens on port 9 locally; the token request fails first.
    let client = client("http://127.0.0.1:9");
    let err = client.poll("anyone").await.unwrap_err();
    assert!(matches!(err, AdapterError::Auth(_)));
}
