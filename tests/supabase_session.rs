//! Hosted backend session handling against an in-process stand-in server

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use folio::auth::{AuthBackend, AuthEventKind, AuthGate, GateDecision};
use folio::storage::RemoteTable;
use folio::supabase::{SupabaseAuth, SupabaseClient};
use serde_json::{Value, json};

const ADMIN: &str = "owner@example.com";
const ANON: &str = "anon-key";

#[derive(Default)]
struct Backend {
    reject_refresh: AtomicBool,
}

fn token(access: &str, refresh: &str, expires_in: u64) -> Value {
    json!({
        "access_token": access,
        "token_type": "bearer",
        "refresh_token": refresh,
        "expires_in": expires_in,
        "user": { "id": "u-1", "email": ADMIN }
    })
}

async fn grant(
    State(backend): State<Arc<Backend>>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    match params.get("grant_type").map(String::as_str) {
        // Already expired on arrival
        Some("password") => Json(token("jwt-1", "r-1", 0)).into_response(),
        Some("refresh_token") if !backend.reject_refresh.load(Ordering::SeqCst) && body["refresh_token"] == "r-1" => {
            Json(token("jwt-2", "r-2", 3600)).into_response()
        }
        _ => (StatusCode::BAD_REQUEST, Json(json!({ "error_description": "Invalid Refresh Token" }))).into_response(),
    }
}

/// Rows are public, any user token is treated as expired
async fn projects(headers: HeaderMap) -> Response {
    let bearer = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let anon = format!("Bearer {ANON}");
    if bearer == Some(anon.as_str()) {
        Json(json!([{ "id": 1, "title": "Public" }])).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "JWT expired" }))).into_response()
    }
}

async fn serve(backend: Arc<Backend>) -> Arc<SupabaseClient> {
    let router = Router::new()
        .route("/auth/v1/token", post(grant))
        .route("/rest/v1/projects", get(projects))
        .with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Arc::new(SupabaseClient::new(&format!("http://{addr}"), ANON).unwrap())
}

#[tokio::test]
async fn test_public_reads_ignore_expired_session() {
    let client = serve(Arc::new(Backend::default())).await;
    client.set_access_token(Some("expired-jwt".into()));

    let rows = client.select_all("projects", "created_at").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], "Public");
}

#[tokio::test]
async fn test_expiring_session_is_refreshed() {
    let client = serve(Arc::new(Backend::default())).await;
    let auth = SupabaseAuth::new(client.clone());
    let mut events = auth.subscribe();

    let session = auth.sign_in_with_password(ADMIN, "secret").await.unwrap();
    assert_eq!(session.access_token, "jwt-1");

    let live = auth.get_session().await.unwrap().unwrap();
    assert_eq!(live.access_token, "jwt-2");
    assert_eq!(client.access_token().as_deref(), Some("jwt-2"));

    assert_eq!(events.try_recv().unwrap().kind, AuthEventKind::SignedIn);
    assert_eq!(events.try_recv().unwrap().kind, AuthEventKind::TokenRefreshed);

    // Fresh for an hour, no second refresh
    assert_eq!(auth.get_session().await.unwrap().unwrap().access_token, "jwt-2");
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_admin_keeps_access_across_refresh() {
    let client = serve(Arc::new(Backend::default())).await;
    let gate = AuthGate::new(Arc::new(SupabaseAuth::new(client)), ADMIN);

    let issued = gate.sign_in(ADMIN, "secret").await.data.unwrap().access_token;
    let session = gate.authorize(Some(&issued)).await.unwrap();
    assert_eq!(session.access_token, "jwt-2");
}

#[tokio::test]
async fn test_rejected_refresh_ends_session() {
    let backend = Arc::new(Backend::default());
    backend.reject_refresh.store(true, Ordering::SeqCst);
    let client = serve(backend).await;
    let auth = Arc::new(SupabaseAuth::new(client.clone()));
    let gate = AuthGate::new(auth.clone(), ADMIN);

    let issued = gate.sign_in(ADMIN, "secret").await.data.unwrap().access_token;
    let mut events = auth.subscribe();

    assert_eq!(gate.authorize(Some(&issued)).await.unwrap_err(), GateDecision::login());
    assert!(auth.get_session().await.unwrap().is_none());
    assert_eq!(client.access_token(), None);
    assert_eq!(events.try_recv().unwrap().kind, AuthEventKind::SignedOut);
}
