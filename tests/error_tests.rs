// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use relief_map::error::AppError;
use relief_map::services::TransitionError;

#[test]
fn test_status_codes() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
        (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
        (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
        (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
        (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
        (AppError::Conflict("x".into()), StatusCode::CONFLICT),
        (AppError::Storage("x".into()), StatusCode::BAD_GATEWAY),
        (AppError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        (
            AppError::Internal(anyhow::anyhow!("boom")),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, expected) in cases {
        assert_eq!(err.status_code(), expected, "{}", err);
    }
}

#[test]
fn test_transition_error_is_conflict() {
    let err: AppError = TransitionError::NotHidden.into();
    assert_eq!(err.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_internal_details_withheld() {
    let response = AppError::Database("connection string leaked".to_string()).into_response();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["error"], "database_error");
    assert!(!bytes.windows(6).any(|w| w == b"leaked"));
}

#[tokio::test]
async fn test_conflict_carries_details() {
    let response = AppError::Conflict("cannot approve a rejected pin".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "conflict");
    assert_eq!(body["details"], "cannot approve a rejected pin");
}
