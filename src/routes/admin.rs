// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin console routes. `require_admin` is applied in routes/mod.rs.

use crate::error::Result;
use crate::models::{AdminStats, ReliefPin, UserProfile};
use crate::routes::api::{with_owners, PinResponse};
use crate::services::{ModerationAction, SessionContext, SweepReport};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/pins", get(list_all_pins))
        .route("/api/admin/pins/{id}", delete(delete_pin))
        .route("/api/admin/pins/{id}/{action}", post(moderate_pin))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}/role", post(toggle_role))
        .route("/api/admin/users/{id}/active", post(toggle_active))
        .route("/api/admin/stats", get(admin_stats))
        .route("/api/admin/sweep", post(run_sweep))
}

// ─── Pins ────────────────────────────────────────────────────

/// Every pin, hidden ones included, newest first.
async fn list_all_pins(State(state): State<Arc<AppState>>) -> Result<Json<Vec<PinResponse>>> {
    let pins = state.db.list_pins(&[]).await?;
    Ok(Json(with_owners(&state, pins).await?))
}

async fn moderate_pin(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<SessionContext>,
    Path((id, action)): Path<(Uuid, ModerationAction)>,
) -> Result<Json<ReliefPin>> {
    let pin = state.moderation.apply(&admin, id, action).await?;
    Ok(Json(pin))
}

async fn delete_pin(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.moderation.delete(&admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Run the auto-completion sweep now.
async fn run_sweep(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<SessionContext>,
) -> Json<SweepReport> {
    tracing::info!(admin = %admin.user_id, "Manual sweep requested");
    Json(state.sweeper.sweep().await)
}

// ─── Users ───────────────────────────────────────────────────

async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UserProfile>>> {
    Ok(Json(state.db.list_profiles().await?))
}

async fn toggle_role(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.moderation.toggle_role(&admin, &id).await?))
}

async fn toggle_active(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.moderation.toggle_active(&admin, &id).await?))
}

/// Console counts over every pin and profile.
async fn admin_stats(State(state): State<Arc<AppState>>) -> Result<Json<AdminStats>> {
    let pins = state.db.list_pins(&[]).await?;
    let users = state.db.list_profiles().await?;
    Ok(Json(AdminStats::from_sets(&pins, &users)))
}
