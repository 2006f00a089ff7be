// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GeoJSON export of pin lists for map clients.

use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

use crate::models::{PinStatus, ReliefPin};
use crate::services::visibility::SessionContext;
use crate::time_utils::format_utc_rfc3339;

const OWN_PIN_COLOR: &str = "#9333ea";

/// Marker colour for a pin as seen by `viewer`.
pub fn marker_color(viewer: &SessionContext, pin: &ReliefPin) -> &'static str {
    if pin.is_owned_by(&viewer.user_id) {
        return OWN_PIN_COLOR;
    }
    match pin.status {
        PinStatus::Approved => "#22c55e",
        PinStatus::Pending => "#f59e0b",
        PinStatus::Completed => "#6b7280",
        PinStatus::Rejected => "#ef4444",
    }
}

fn pin_feature(viewer: &SessionContext, pin: &ReliefPin) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), json!(pin.id));
    properties.insert("status".to_string(), json!(pin.status));
    properties.insert("relief_type".to_string(), json!(pin.relief_type));
    properties.insert("location_name".to_string(), json!(pin.location_name));
    properties.insert("is_own".to_string(), json!(pin.is_owned_by(&viewer.user_id)));
    properties.insert("marker_color".to_string(), json!(marker_color(viewer, pin)));
    properties.insert("photo_url".to_string(), json!(pin.photo_url));
    properties.insert(
        "created_at".to_string(),
        json!(format_utc_rfc3339(pin.created_at)),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            pin.longitude,
            pin.latitude,
        ]))),
        id: Some(Id::String(pin.id.to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Render pins as a FeatureCollection of Point features (`[lng, lat]`).
pub fn to_feature_collection(viewer: &SessionContext, pins: &[ReliefPin]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: pins.iter().map(|pin| pin_feature(viewer, pin)).collect(),
        foreign_members: None,
    }
}
