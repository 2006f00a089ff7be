// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pin listing, view filters, stats and map export over HTTP.

use axum::http::{header, StatusCode};
use relief_map::models::{PinPatch, PinStatus, Role};
use serde_json::Value;
use tower::ServiceExt;

mod common;

async fn get_json(app: &axum::Router, uri: &str, user: &str) -> Value {
    let response = app
        .clone()
        .oneshot(common::authed("GET", uri, user, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
    common::json_body(response).await
}

fn ids(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|pin| pin["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_public_user_sees_approved_and_own() {
    let (app, state) = common::create_test_app();
    let mine = common::seed_pin(&state, "me", PinStatus::Pending).await;
    let approved = common::seed_pin(&state, "other", PinStatus::Approved).await;
    let others_pending = common::seed_pin(&state, "other", PinStatus::Pending).await;
    let others_rejected = common::seed_pin(&state, "other", PinStatus::Rejected).await;

    let visible = ids(&get_json(&app, "/api/pins", "me").await);

    assert!(visible.contains(&mine.id.to_string()));
    assert!(visible.contains(&approved.id.to_string()));
    assert!(!visible.contains(&others_pending.id.to_string()));
    assert!(!visible.contains(&others_rejected.id.to_string()));
}

#[tokio::test]
async fn test_admin_sees_all_active() {
    let (app, state) = common::create_test_app();
    common::seed_user(&state, "admin", Role::Admin).await;
    common::seed_pin(&state, "a", PinStatus::Pending).await;
    common::seed_pin(&state, "b", PinStatus::Rejected).await;
    let hidden = common::seed_pin(&state, "c", PinStatus::Approved).await;
    state
        .db
        .update_pin(hidden.id, &PinPatch::visibility(false))
        .await
        .unwrap();

    let visible = ids(&get_json(&app, "/api/pins", "admin").await);
    assert_eq!(visible.len(), 2);
    assert!(!visible.contains(&hidden.id.to_string()));
}

#[tokio::test]
async fn test_hidden_own_pin_not_listed_for_owner() {
    let (app, state) = common::create_test_app();
    let pin = common::seed_pin(&state, "me", PinStatus::Approved).await;
    state
        .db
        .update_pin(pin.id, &PinPatch::visibility(false))
        .await
        .unwrap();

    assert!(ids(&get_json(&app, "/api/pins", "me").await).is_empty());
}

#[tokio::test]
async fn test_status_and_scope_filters() {
    let (app, state) = common::create_test_app();
    common::seed_pin(&state, "me", PinStatus::Pending).await;
    common::seed_pin(&state, "other", PinStatus::Approved).await;
    common::seed_pin(&state, "me", PinStatus::Completed).await;

    let pending = get_json(&app, "/api/pins?status=pending", "me").await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let active = get_json(&app, "/api/pins?scope=active", "me").await;
    assert_eq!(active.as_array().unwrap().len(), 2);

    let mine = get_json(&app, "/api/pins?scope=mine", "me").await;
    assert_eq!(mine.as_array().unwrap().len(), 2);
    assert!(mine
        .as_array()
        .unwrap()
        .iter()
        .all(|pin| pin["user_id"] == "me"));
}

#[tokio::test]
async fn test_bbox_filter_and_validation() {
    let (app, state) = common::create_test_app();
    common::seed_pin(&state, "other", PinStatus::Approved).await;

    let inside = get_json(&app, "/api/pins?bbox=123.0,10.0,124.0,11.0", "me").await;
    assert_eq!(inside.as_array().unwrap().len(), 1);

    let outside = get_json(&app, "/api/pins?bbox=120.0,14.0,121.0,15.0", "me").await;
    assert!(outside.as_array().unwrap().is_empty());

    let response = app
        .oneshot(common::authed("GET", "/api/pins?bbox=1,2,3", "me", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_status_filter_rejected() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(common::authed("GET", "/api/pins?status=archived", "me", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_listing_joins_owner_summary() {
    let (app, state) = common::create_test_app();
    common::seed_user(&state, "other", Role::Public).await;
    common::seed_pin(&state, "other", PinStatus::Approved).await;
    common::seed_pin(&state, "ghost", PinStatus::Approved).await;

    let list = get_json(&app, "/api/pins", "me").await;
    let by_owner = |owner: &str| {
        list.as_array()
            .unwrap()
            .iter()
            .find(|pin| pin["user_id"] == owner)
            .cloned()
            .unwrap()
    };

    assert!(by_owner("other")["owner"].is_object());
    assert!(by_owner("ghost")["owner"].is_null());
    assert!(by_owner("other")["owner"].get("email").is_none());
}

#[tokio::test]
async fn test_dashboard_stats() {
    let (app, state) = common::create_test_app();
    common::seed_pin(&state, "me", PinStatus::Pending).await;
    common::seed_pin(&state, "other", PinStatus::Approved).await;
    common::seed_pin(&state, "other", PinStatus::Pending).await;

    let stats = get_json(&app, "/api/pins/stats", "me").await;
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["approved"], 1);
    assert_eq!(stats["pending"], 1);
    assert_eq!(stats["mine"], 1);
}

#[tokio::test]
async fn test_geojson_export() {
    let (app, state) = common::create_test_app();
    common::seed_pin(&state, "me", PinStatus::Pending).await;

    let response = app
        .oneshot(common::authed("GET", "/api/pins/geojson", "me", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/geo+json"
    );

    let body = common::json_body(response).await;
    assert_eq!(body["type"], "FeatureCollection");
    let feature = &body["features"][0];
    assert_eq!(feature["geometry"]["coordinates"][0], 123.9);
    assert_eq!(feature["properties"]["is_own"], true);
    assert_eq!(feature["properties"]["marker_color"], "#9333ea");
}

#[tokio::test]
async fn test_event_stream_is_sse() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(common::authed("GET", "/api/pins/events", "me", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
}
