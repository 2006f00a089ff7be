// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication, session attach and admin gate middleware.

use crate::error::AppError;
use crate::services::SessionContext;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "relief_token";

/// Session token lifetime (30 days).
pub const TOKEN_LIFETIME_SECS: u64 = 30 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (authentication identity)
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at (Unix timestamp)
    pub iat: u64,
}

/// Authenticated identity extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
    /// Token issue time; with `user_id` it identifies the session
    pub issued_at: u64,
}

/// Verify an HS256 session token.
pub fn decode_claims(token: &str, signing_key: &[u8]) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        AppError::InvalidToken
    })?;

    if token_data.claims.sub.trim().is_empty() {
        return Err(AppError::InvalidToken);
    }
    Ok(token_data.claims)
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(SESSION_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) => token.to_string(),
            None => return Err(AppError::Unauthorized),
        }
    };

    let claims = decode_claims(&token, &state.config.jwt_signing_key)?;

    request.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        email: claims.email,
        issued_at: claims.iat,
    });

    Ok(next.run(request).await)
}

/// Resolve the caller's profile into a [`SessionContext`].
///
/// Runs after `require_auth`. The first request of each session also runs
/// the auto-completion sweep before reaching the handler.
pub async fn attach_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or(AppError::Unauthorized)?;

    let session = state
        .sessions
        .attach(&user.user_id, user.email.as_deref(), user.issued_at)
        .await?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Reject callers whose session is not an admin session.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let session = request.extensions().get::<SessionContext>();

    match session {
        Some(session) if session.is_admin() => Ok(next.run(request).await),
        Some(session) => {
            tracing::warn!(
                user_id = %session.user_id,
                path = %request.uri().path(),
                "Non-admin attempted admin route"
            );
            Err(AppError::Forbidden("Admin role required".to_string()))
        }
        None => Err(AppError::Unauthorized),
    }
}

/// Create a JWT for a user session.
pub fn create_jwt(user_id: &str, email: Option<&str>, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.map(str::to_string),
        iat: now,
        exp: now + TOKEN_LIFETIME_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
