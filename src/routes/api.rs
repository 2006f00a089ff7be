// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::models::{DashboardStats, ReliefPin, UserProfile};
use crate::services::map::to_feature_collection;
use crate::services::storage::MAX_PHOTO_BYTES;
use crate::services::visibility::fetch_visible;
use crate::services::{BoundingBox, PinInput, PinView, Scope, SessionContext, StatusFilter};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, put},
    Extension, Json, Router,
};
use futures_util::stream::{self, Stream, StreamExt};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// API routes (require an attached session).
/// The auth and session middleware are applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/pins", get(list_pins).post(create_pin))
        .route("/api/pins/geojson", get(pins_geojson))
        .route("/api/pins/stats", get(pin_stats))
        .route("/api/pins/events", get(pin_events))
        .route("/api/pins/{id}", put(edit_pin))
        .route(
            "/api/photos",
            put(upload_photo).layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES)),
        )
}

// ─── User Profile ────────────────────────────────────────────

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<UserProfile>> {
    let profile = state
        .db
        .get_profile(&session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", session.user_id)))?;
    Ok(Json(profile))
}

// ─── Pin Listing ─────────────────────────────────────────────

/// Query parameters for pin listings.
#[derive(Debug, Default, Deserialize)]
pub struct PinQuery {
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub scope: Scope,
    /// `minLng,minLat,maxLng,maxLat`
    pub bbox: Option<String>,
}

impl PinQuery {
    fn into_view(self) -> Result<PinView> {
        let bbox = self
            .bbox
            .as_deref()
            .map(str::parse::<BoundingBox>)
            .transpose()?;
        Ok(PinView {
            status: self.status,
            scope: self.scope,
            bbox,
        })
    }
}

/// Display-only summary of a pin's owner.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OwnerSummary {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Pin with its owner joined for display.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PinResponse {
    #[serde(flatten)]
    pub pin: ReliefPin,
    pub owner: Option<OwnerSummary>,
}

/// Attach owner summaries to a pin list.
pub(crate) async fn with_owners(state: &AppState, pins: Vec<ReliefPin>) -> Result<Vec<PinResponse>> {
    if pins.is_empty() {
        return Ok(Vec::new());
    }

    let owner_ids: Vec<String> = pins
        .iter()
        .map(|pin| pin.user_id.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let owners: HashMap<String, OwnerSummary> = state
        .db
        .get_profiles(&owner_ids)
        .await?
        .into_iter()
        .map(|profile| {
            (
                profile.id,
                OwnerSummary {
                    full_name: profile.full_name,
                    avatar_url: profile.avatar_url,
                },
            )
        })
        .collect();

    Ok(pins
        .into_iter()
        .map(|pin| {
            let owner = owners.get(&pin.user_id).cloned();
            PinResponse { pin, owner }
        })
        .collect())
}

/// The caller's visible pins narrowed by the requested view.
async fn select_pins(
    state: &AppState,
    session: &SessionContext,
    query: PinQuery,
) -> Result<Vec<ReliefPin>> {
    let view = query.into_view()?;
    let visible = fetch_visible(state.db.as_ref(), session).await?;
    Ok(view.apply(session, visible))
}

/// List visible pins, newest first.
async fn list_pins(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Query(query): Query<PinQuery>,
) -> Result<Json<Vec<PinResponse>>> {
    let pins = select_pins(&state, &session, query).await?;
    Ok(Json(with_owners(&state, pins).await?))
}

/// Visible pins as GeoJSON for map clients.
async fn pins_geojson(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Query(query): Query<PinQuery>,
) -> Result<impl IntoResponse> {
    let pins = select_pins(&state, &session, query).await?;
    let collection: FeatureCollection = to_feature_collection(&session, &pins);
    Ok((
        [(header::CONTENT_TYPE, "application/geo+json")],
        Json(collection),
    ))
}

/// Dashboard counts over the caller's visible pins.
async fn pin_stats(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<DashboardStats>> {
    let visible = fetch_visible(state.db.as_ref(), &session).await?;
    Ok(Json(DashboardStats::from_pins(&visible, &session.user_id)))
}

// ─── Change Notifications ────────────────────────────────────

/// Server-Sent Events stream of pin changes.
///
/// Events carry no pin content; clients re-run their listing on any event.
async fn pin_events(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let rx = state.notifier.subscribe();
    tracing::debug!(user_id = %session.user_id, "Pin event stream opened");

    let connected =
        stream::once(async { Ok::<_, Infallible>(Event::default().event("connected").data("ok")) });

    let events = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(change) => Event::default()
                .event(change.kind.as_str())
                .json_data(&change)
                .ok()
                .map(Ok),
            Err(BroadcastStreamRecvError::Lagged(missed)) => Event::default()
                .event("lagged")
                .json_data(serde_json::json!({ "missed": missed }))
                .ok()
                .map(Ok),
        }
    });

    Sse::new(connected.chain(events)).keep_alive(KeepAlive::default())
}

// ─── Submission ──────────────────────────────────────────────

/// Submit a new pin.
async fn create_pin(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    ValidatedJson(input): ValidatedJson<PinInput>,
) -> Result<(StatusCode, Json<ReliefPin>)> {
    let pin = state.submissions.create(&session, input).await?;
    Ok((StatusCode::CREATED, Json(pin)))
}

/// Owner edit; the pin goes back through moderation.
async fn edit_pin(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
    ValidatedJson(input): ValidatedJson<PinInput>,
) -> Result<Json<ReliefPin>> {
    let pin = state.submissions.edit(&session, id, input).await?;
    Ok(Json(pin))
}

#[derive(Debug, Deserialize)]
pub struct PhotoQuery {
    pub ext: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PhotoResponse {
    pub photo_url: String,
}

/// Stage a photo in object storage ahead of a submission.
async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Query(query): Query<PhotoQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PhotoResponse>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let photo_url = state
        .photos
        .upload_photo(&session.user_id, &query.ext, content_type, body)
        .await?;

    Ok(Json(PhotoResponse { photo_url }))
}
