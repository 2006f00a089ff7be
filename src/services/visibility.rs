// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pin visibility rules and list-view derivation.
//!
//! Visibility is decided in two steps:
//! 1. The authorization rule: hidden pins are never visible; admins see every
//!    active pin; everyone else sees approved pins plus their own.
//! 2. The view filter chosen by the client (status, scope, bounding box),
//!    applied to the authorized set only.

use std::str::FromStr;

use geo::{coord, Intersects, Rect};
use serde::Deserialize;

use crate::db::{Database, PinFilter};
use crate::error::{AppError, Result};
use crate::models::{PinStatus, ReliefPin, Role, UserProfile};

/// Identity of the requester for the lifetime of an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

impl SessionContext {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.id.clone(),
            email: profile.email.clone(),
            role: profile.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Whether `viewer` is authorized to see `pin`.
pub fn can_view(viewer: &SessionContext, pin: &ReliefPin) -> bool {
    if !pin.is_active {
        return false;
    }
    match viewer.role {
        Role::Admin => true,
        Role::Public => pin.status == PinStatus::Approved || pin.is_owned_by(&viewer.user_id),
    }
}

/// Keep only the pins `viewer` may see, preserving order.
pub fn visible_pins(viewer: &SessionContext, pins: Vec<ReliefPin>) -> Vec<ReliefPin> {
    pins.into_iter().filter(|pin| can_view(viewer, pin)).collect()
}

/// Store query that narrows the collection to the viewer's visible set.
pub fn visibility_filters(viewer: &SessionContext) -> Vec<PinFilter> {
    let mut filters = vec![PinFilter::IsActive(true)];
    if !viewer.is_admin() {
        filters.push(PinFilter::AnyOf(vec![
            PinFilter::Status(PinStatus::Approved),
            PinFilter::Owner(viewer.user_id.clone()),
        ]));
    }
    filters
}

/// Fetch the viewer's visible pins, newest first.
pub async fn fetch_visible(db: &dyn Database, viewer: &SessionContext) -> Result<Vec<ReliefPin>> {
    let pins = db.list_pins(&visibility_filters(viewer)).await?;
    Ok(visible_pins(viewer, pins))
}

// ─── View Filters ────────────────────────────────────────────

/// Client-side status facet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl StatusFilter {
    pub fn matches(self, status: PinStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == PinStatus::Pending,
            StatusFilter::Approved => status == PinStatus::Approved,
            StatusFilter::Rejected => status == PinStatus::Rejected,
            StatusFilter::Completed => status == PinStatus::Completed,
        }
    }
}

/// Which slice of the visible set a list shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    All,
    /// Everything except completed relief
    Active,
    /// Only the viewer's own submissions
    Mine,
}

/// Map viewport: `minLng,minLat,maxLng,maxLat`. Edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox(Rect<f64>);

impl BoundingBox {
    pub fn contains(&self, pin: &ReliefPin) -> bool {
        pin.location().intersects(&self.0)
    }
}

impl FromStr for BoundingBox {
    type Err = AppError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || {
            AppError::BadRequest(
                "Invalid 'bbox' parameter: expected minLng,minLat,maxLng,maxLat".to_string(),
            )
        };

        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| invalid())?;

        let [min_lng, min_lat, max_lng, max_lat] = parts[..] else {
            return Err(invalid());
        };

        let lng_ok = |v: f64| (-180.0..=180.0).contains(&v);
        let lat_ok = |v: f64| (-90.0..=90.0).contains(&v);
        if !(lng_ok(min_lng) && lng_ok(max_lng) && lat_ok(min_lat) && lat_ok(max_lat)) {
            return Err(invalid());
        }
        if min_lng > max_lng || min_lat > max_lat {
            return Err(invalid());
        }

        Ok(Self(Rect::new(
            coord! { x: min_lng, y: min_lat },
            coord! { x: max_lng, y: max_lat },
        )))
    }
}

/// A list view over the visible set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PinView {
    pub status: StatusFilter,
    pub scope: Scope,
    pub bbox: Option<BoundingBox>,
}

impl PinView {
    pub fn matches(&self, viewer: &SessionContext, pin: &ReliefPin) -> bool {
        let in_scope = match self.scope {
            Scope::All => true,
            Scope::Active => pin.status != PinStatus::Completed,
            Scope::Mine => pin.is_owned_by(&viewer.user_id),
        };
        in_scope
            && self.status.matches(pin.status)
            && self.bbox.map_or(true, |bbox| bbox.contains(pin))
    }

    /// Derive the view from an already-authorized pin set.
    pub fn apply(&self, viewer: &SessionContext, pins: Vec<ReliefPin>) -> Vec<ReliefPin> {
        pins.into_iter()
            .filter(|pin| self.matches(viewer, pin))
            .collect()
    }
}
