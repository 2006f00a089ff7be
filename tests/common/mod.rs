// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use relief_map::config::{Config, ModerationPolicy};
use relief_map::db::{Database, FirestoreDb, MemoryDb};
use relief_map::middleware::auth::create_jwt;
use relief_map::models::{PinContent, PinStatus, ProfilePatch, ReliefPin, ReliefType, Role};
use relief_map::routes::create_router;
use relief_map::AppState;
use std::sync::Arc;

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

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app over an in-memory database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Config::test_default(), Arc::new(MemoryDb::new()))
}

/// Create a test app using the given moderation policy.
#[allow(dead_code)]
pub fn create_test_app_with_policy(policy: ModerationPolicy) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.moderation_policy = policy;
    create_test_app_with(config, Arc::new(MemoryDb::new()))
}

#[allow(dead_code)]
pub fn create_test_app_with(
    config: Config,
    db: Arc<dyn Database>,
) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, db));
    (create_router(state.clone()), state)
}

/// Bearer token for `user_id` signed with the test key.
#[allow(dead_code)]
pub fn token_for(user_id: &str) -> String {
    create_jwt(
        user_id,
        Some(&format!("{}@example.com", user_id)),
        &Config::test_default().jwt_signing_key,
    )
    .unwrap()
}

/// Build an authenticated request.
#[allow(dead_code)]
pub fn authed(method: &str, uri: &str, user_id: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(user_id)));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Ensure a profile exists for `user_id` with the given role.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, user_id: &str, role: Role) {
    state
        .sessions
        .attach(user_id, Some(&format!("{}@example.com", user_id)), 0)
        .await
        .unwrap();
    if role == Role::Admin {
        state
            .db
            .update_profile(
                user_id,
                &ProfilePatch {
                    role: Some(Role::Admin),
                    ..ProfilePatch::default()
                },
            )
            .await
            .unwrap();
    }
}

/// Insert a pin directly into the store.
#[allow(dead_code)]
pub async fn seed_pin(state: &AppState, owner: &str, status: PinStatus) -> ReliefPin {
    let pin = ReliefPin::new(
        owner,
        PinContent {
            latitude: 10.5,
            longitude: 123.9,
            location_name: "Barangay Hall".to_string(),
            relief_type: ReliefType::Food,
            description: "Rice packs".to_string(),
            photo_url: None,
            start_datetime: None,
            end_datetime: None,
        },
        status,
        chrono::Utc::now(),
    );
    state.db.insert_pin(&pin).await.unwrap();
    pin
}

/// A valid pin payload.
#[allow(dead_code)]
pub fn pin_payload() -> serde_json::Value {
    serde_json::json!({
        "latitude": 10.5,
        "longitude": 123.9,
        "location_name": "Barangay Hall",
        "relief_type": "food",
        "description": "Rice packs"
    })
}
