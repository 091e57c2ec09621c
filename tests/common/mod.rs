// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use challenge_tracker::config::Config;
use challenge_tracker::db::{Db, FirestoreDb};
use challenge_tracker::middleware::auth::create_jwt;
use challenge_tracker::routes::create_router;
use challenge_tracker::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection against the emulator.
#[allow(dead_code)]
pub async fn test_firestore() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::test_default(), Db::memory()));
    (create_router(state.clone()), state)
}

/// Create a session token for `external_id` signed with the test key.
#[allow(dead_code)]
pub fn create_test_jwt(external_id: &str, signing_key: &[u8]) -> String {
    create_jwt(external_id, signing_key).expect("Failed to sign test JWT")
}

/// Send an authenticated request with an optional JSON body.
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    token: &str,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> Response<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Sign in `external_id` and return its token.
#[allow(dead_code)]
pub async fn signed_in_user(app: &axum::Router, state: &AppState, external_id: &str) -> String {
    let token = create_test_jwt(external_id, &state.config.jwt_signing_key);
    let response = send(
        app,
        &token,
        "POST",
        "/api/me",
        Some(serde_json::json!({ "email": format!("{}@example.com", external_id) })),
    )
    .await;
    assert!(response.status().is_success());
    token
}
