// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Relief pin model and its moderation status machine.

use chrono::{DateTime, Utc};
use geo::Point;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// Kind of relief distributed at a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ReliefType {
    Food,
    Medical,
    Shelter,
    Water,
    Clothing,
    Other,
}

impl ReliefType {
    pub const ALL: [ReliefType; 6] = [
        ReliefType::Food,
        ReliefType::Medical,
        ReliefType::Shelter,
        ReliefType::Water,
        ReliefType::Clothing,
        ReliefType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReliefType::Food => "food",
            ReliefType::Medical => "medical",
            ReliefType::Shelter => "shelter",
            ReliefType::Water => "water",
            ReliefType::Clothing => "clothing",
            ReliefType::Other => "other",
        }
    }
}

/// Moderation status of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum PinStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

/// Events that move a pin through the moderation workflow.
///
/// Visibility (hide/unhide) and deletion are not status events: they never
/// change the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    Approve,
    Reject,
    Complete,
    /// The pin's relief window has elapsed.
    Expire,
}

impl PinStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PinStatus::Pending => "pending",
            PinStatus::Approved => "approved",
            PinStatus::Rejected => "rejected",
            PinStatus::Completed => "completed",
        }
    }

    /// Status reached by applying `event`, or `None` if the transition is illegal.
    pub fn on_event(self, event: StatusEvent) -> Option<PinStatus> {
        match (self, event) {
            (PinStatus::Pending, StatusEvent::Approve) => Some(PinStatus::Approved),
            (PinStatus::Pending, StatusEvent::Reject) => Some(PinStatus::Rejected),
            (PinStatus::Approved, StatusEvent::Complete | StatusEvent::Expire) => {
                Some(PinStatus::Completed)
            }
            (PinStatus::Pending, StatusEvent::Complete | StatusEvent::Expire)
            | (PinStatus::Approved, StatusEvent::Approve | StatusEvent::Reject)
            | (PinStatus::Rejected, _)
            | (PinStatus::Completed, _) => None,
        }
    }

    /// Rejected and completed pins accept no further status events.
    pub fn is_final(self) -> bool {
        match self {
            PinStatus::Rejected | PinStatus::Completed => true,
            PinStatus::Pending | PinStatus::Approved => false,
        }
    }
}

impl std::fmt::Display for PinStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored relief pin document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReliefPin {
    /// Pin ID (also used as document ID)
    pub id: Uuid,
    /// Identity that submitted the pin; fixed at creation
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: String,
    pub relief_type: ReliefType,
    pub description: String,
    /// Public reference to the staged photo
    pub photo_url: Option<String>,
    pub status: PinStatus,
    /// Hidden pins (`false`) are kept for audit but never listed
    pub is_active: bool,
    pub start_datetime: Option<DateTime<Utc>>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReliefPin {
    /// Build a new pin from validated content.
    pub fn new(
        user_id: impl Into<String>,
        content: PinContent,
        status: PinStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            latitude: content.latitude,
            longitude: content.longitude,
            location_name: content.location_name,
            relief_type: content.relief_type,
            description: content.description,
            photo_url: content.photo_url,
            status,
            is_active: true,
            start_datetime: content.start_datetime,
            end_datetime: content.end_datetime,
            created_at: now,
            updated_at: now,
        }
    }

    /// Pin coordinate as a geo point (x = longitude, y = latitude).
    pub fn location(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// Status the pin moves to once its relief window has ended before `now`,
    /// or `None` if the window is open, unset, or the status does not expire.
    pub fn expired_status(&self, now: DateTime<Utc>) -> Option<PinStatus> {
        match self.end_datetime {
            Some(end) if end < now => self.status.on_event(StatusEvent::Expire),
            _ => None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expired_status(now).is_some()
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Owner-editable fields of a pin.
#[derive(Debug, Clone, PartialEq)]
pub struct PinContent {
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: String,
    pub relief_type: ReliefType,
    pub description: String,
    pub photo_url: Option<String>,
    pub start_datetime: Option<DateTime<Utc>>,
    pub end_datetime: Option<DateTime<Utc>>,
}

/// Field-subset update of a pin. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PinPatch {
    pub status: Option<PinStatus>,
    pub is_active: Option<bool>,
    pub content: Option<PinContent>,
}

impl PinPatch {
    pub fn status(status: PinStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn visibility(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }

    /// Apply the patch in place and bump `updated_at`.
    pub fn apply_to(&self, pin: &mut ReliefPin, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            pin.status = status;
        }
        if let Some(is_active) = self.is_active {
            pin.is_active = is_active;
        }
        if let Some(content) = &self.content {
            pin.latitude = content.latitude;
            pin.longitude = content.longitude;
            pin.location_name = content.location_name.clone();
            pin.relief_type = content.relief_type;
            pin.description = content.description.clone();
            pin.photo_url = content.photo_url.clone();
            pin.start_datetime = content.start_datetime;
            pin.end_datetime = content.end_datetime;
        }
        pin.updated_at = now;
    }

    /// Document field paths written by this patch.
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.status.is_some() {
            paths.push("status");
        }
        if self.is_active.is_some() {
            paths.push("is_active");
        }
        if self.content.is_some() {
            paths.extend([
                "latitude",
                "longitude",
                "location_name",
                "relief_type",
                "description",
                "photo_url",
                "start_datetime",
                "end_datetime",
            ]);
        }
        paths.push("updated_at");
        paths
    }
}
