// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pin submission: payload validation, creation and owner edits.

use std::borrow::Cow;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::config::ModerationPolicy;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{PinContent, PinPatch, ReliefPin, ReliefType};
use crate::services::notifier::{ChangeKind, ChangeNotifier};
use crate::services::storage::PhotoStorage;
use crate::services::visibility::SessionContext;

/// Pin payload for create and edit.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PinInput {
    #[validate(range(min = -90.0, max = 90.0, message = "latitude must be between -90 and 90"))]
    pub latitude: f64,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "longitude must be between -180 and 180"
    ))]
    pub longitude: f64,

    #[validate(
        length(min = 1, max = 200, message = "location_name must be 1-200 characters"),
        custom(function = "not_blank")
    )]
    pub location_name: String,

    pub relief_type: ReliefType,

    #[validate(
        length(min = 1, max = 2000, message = "description must be 1-2000 characters"),
        custom(function = "not_blank")
    )]
    pub description: String,

    pub photo_url: Option<String>,
    pub start_datetime: Option<DateTime<Utc>>,
    pub end_datetime: Option<DateTime<Utc>>,
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message(Cow::from("must not be blank")));
    }
    Ok(())
}

impl PinInput {
    /// Validate the payload under `policy` and produce storable content.
    pub fn validate_for(
        self,
        policy: ModerationPolicy,
        photos: &PhotoStorage,
    ) -> Result<PinContent> {
        self.validate()?;

        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(AppError::Validation(
                "latitude and longitude must be finite numbers".to_string(),
            ));
        }

        match (self.start_datetime, self.end_datetime) {
            (Some(start), Some(end)) if end <= start => {
                return Err(AppError::Validation(
                    "end_datetime must be after start_datetime".to_string(),
                ));
            }
            (Some(_), Some(_)) => {}
            _ if policy.requires_window() => {
                return Err(AppError::Validation(
                    "start_datetime and end_datetime are required".to_string(),
                ));
            }
            _ => {}
        }

        let photo_url = self
            .photo_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        if let Some(url) = &photo_url {
            if !photos.owns_reference(url) {
                return Err(AppError::Validation(
                    "photo_url must reference an uploaded photo".to_string(),
                ));
            }
        }

        Ok(PinContent {
            latitude: self.latitude,
            longitude: self.longitude,
            location_name: self.location_name.trim().to_string(),
            relief_type: self.relief_type,
            description: self.description.trim().to_string(),
            photo_url,
            start_datetime: self.start_datetime,
            end_datetime: self.end_datetime,
        })
    }
}

/// Creates pins and applies owner edits under the configured policy.
#[derive(Clone)]
pub struct SubmissionService {
    db: Arc<dyn Database>,
    notifier: ChangeNotifier,
    photos: PhotoStorage,
    policy: ModerationPolicy,
}

impl SubmissionService {
    pub fn new(
        db: Arc<dyn Database>,
        notifier: ChangeNotifier,
        photos: PhotoStorage,
        policy: ModerationPolicy,
    ) -> Self {
        Self {
            db,
            notifier,
            photos,
            policy,
        }
    }

    /// Validate and store a new pin owned by `author`.
    pub async fn create(&self, author: &SessionContext, input: PinInput) -> Result<ReliefPin> {
        let content = input.validate_for(self.policy, &self.photos)?;
        let pin = ReliefPin::new(
            author.user_id.clone(),
            content,
            self.policy.initial_status(),
            Utc::now(),
        );

        self.db.insert_pin(&pin).await?;

        tracing::info!(
            pin_id = %pin.id,
            user_id = %author.user_id,
            relief_type = pin.relief_type.as_str(),
            status = pin.status.as_str(),
            "Pin submitted"
        );
        self.notifier.publish(ChangeKind::Insert, Some(pin.id));
        Ok(pin)
    }

    /// Replace a pin's content and send it back through moderation.
    pub async fn edit(
        &self,
        author: &SessionContext,
        pin_id: Uuid,
        input: PinInput,
    ) -> Result<ReliefPin> {
        let content = input.validate_for(self.policy, &self.photos)?;

        let pin = self
            .db
            .get_pin(pin_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pin {} not found", pin_id)))?;

        if !pin.is_owned_by(&author.user_id) {
            return Err(AppError::Forbidden(
                "Only the pin's owner may edit it".to_string(),
            ));
        }
        if !pin.is_active {
            return Err(AppError::Conflict("Hidden pins cannot be edited".to_string()));
        }
        if pin.status.is_final() {
            return Err(AppError::Conflict(format!(
                "A {} pin cannot be edited",
                pin.status
            )));
        }

        let patch = PinPatch {
            status: Some(self.policy.initial_status()),
            content: Some(content),
            ..PinPatch::default()
        };
        let updated = self
            .db
            .update_pin(pin_id, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pin {} not found", pin_id)))?;

        tracing::info!(
            pin_id = %pin_id,
            user_id = %author.user_id,
            from = pin.status.as_str(),
            to = updated.status.as_str(),
            "Pin edited"
        );
        self.notifier.publish(ChangeKind::Update, Some(pin_id));
        Ok(updated)
    }
}
