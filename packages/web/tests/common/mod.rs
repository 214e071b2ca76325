#![allow(dead_code)]

use std::sync::Arc;

use api::backend::MemoryBackend;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use web::AppState;

pub fn app(backend: Arc<MemoryBackend>) -> Router {
    web::router(AppState::with_backend(backend))
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// An account with a profile row of the given role, and a token for it.
pub fn member(backend: &MemoryBackend, email: &str, role: &str) -> (Uuid, String) {
    let user = backend.seed_user(email, "secret1", "Member");
    backend.seed_row(
        "users",
        json!({
            "id": user.id,
            "email": email,
            "name": "Member",
            "role": role,
            "meditation_streak": 4,
            "total_meditations": 12,
            "journal_entries": 0,
            "created_at": "2026-03-01T08:00:00Z",
        }),
    );
    let token = backend.issue_token(user.id);
    (user.id, token)
}
