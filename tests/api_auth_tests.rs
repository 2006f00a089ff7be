// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Valid tokens (header or cookie) attach a session and create the profile
//! 3. Deactivated accounts and non-admins are refused
//! 4. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use relief_map::config::Config;
use relief_map::db::FirestoreDb;
use relief_map::models::{ProfilePatch, Role};
use std::sync::Arc;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/pins")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Should return 401 Unauthorized without token
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::json_body(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/pins")
                .header(header::AUTHORIZATION, "Bearer invalid.token.here")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_key_rejected() {
    let (app, _) = common::create_test_app();
    let token = relief_map::middleware::auth::create_jwt(
        "user-1",
        None,
        b"some_other_signing_key_32_bytes!",
    )
    .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_first_request_creates_public_profile() {
    let (app, state) = common::create_test_app();

    let response = app
        .oneshot(common::authed("GET", "/api/me", "new-user", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["id"], "new-user");
    assert_eq!(body["email"], "new-user@example.com");
    assert_eq!(body["role"], "public");
    assert_eq!(body["is_active"], true);

    assert!(state.db.get_profile("new-user").await.unwrap().is_some());
}

#[tokio::test]
async fn test_cookie_token_accepted() {
    let (app, _) = common::create_test_app();
    let token = common::token_for("cookie-user");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::COOKIE, format!("relief_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_deactivated_user_forbidden() {
    let (app, state) = common::create_test_app();
    common::seed_user(&state, "banned", Role::Public).await;
    state
        .db
        .update_profile(
            "banned",
            &ProfilePatch {
                is_active: Some(false),
                ..ProfilePatch::default()
            },
        )
        .await
        .unwrap();

    let response = app
        .oneshot(common::authed("GET", "/api/pins", "banned", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let (app, state) = common::create_test_app();
    common::seed_user(&state, "regular", Role::Public).await;
    common::seed_user(&state, "boss", Role::Admin).await;

    let response = app
        .clone()
        .oneshot(common::authed("GET", "/api/admin/pins", "regular", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(common::authed("GET", "/api/admin/pins", "boss", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_store_unavailable_is_500_without_details() {
    let (app, _) = common::create_test_app_with(
        Config::test_default(),
        Arc::new(FirestoreDb::new_mock()),
    );

    let response = app
        .oneshot(common::authed("GET", "/api/pins", "user-1", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::json_body(response).await;
    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/pins")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // OPTIONS should return 200 (CORS preflight success)
    assert_eq!(response.status(), StatusCode::OK);

    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_public_route_no_auth_required() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("X-Frame-Options").unwrap(),
        "DENY"
    );
    let body = common::json_body(response).await;
    assert_eq!(body["status"], "ok");
}
