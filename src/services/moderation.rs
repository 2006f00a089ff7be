// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin moderation of pins and profiles.
//!
//! Transitions are planned against the current stored pin and then written
//! as a single field-subset update. Role checks happen at the routing layer
//! (`require_admin`); this service only enforces transition legality and the
//! self-service guard on profile toggles.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{PinPatch, PinStatus, ProfilePatch, ReliefPin, StatusEvent, UserProfile};
use crate::services::notifier::{ChangeKind, ChangeNotifier};
use crate::services::visibility::SessionContext;

/// Admin action on a single pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Approve,
    Reject,
    Complete,
    Hide,
    Unhide,
}

impl ModerationAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ModerationAction::Approve => "approve",
            ModerationAction::Reject => "reject",
            ModerationAction::Complete => "complete",
            ModerationAction::Hide => "hide",
            ModerationAction::Unhide => "unhide",
        }
    }
}

impl std::fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a moderation action cannot be applied to a pin.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot {action} a {status} pin")]
    IllegalStatus {
        action: ModerationAction,
        status: PinStatus,
    },

    #[error("pin is already hidden")]
    AlreadyHidden,

    #[error("pin is not hidden")]
    NotHidden,
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::Conflict(err.to_string())
    }
}

/// Compute the write that `action` makes on `pin`, or why it is illegal.
pub fn plan_transition(
    pin: &ReliefPin,
    action: ModerationAction,
) -> std::result::Result<PinPatch, TransitionError> {
    let event = match action {
        ModerationAction::Approve => StatusEvent::Approve,
        ModerationAction::Reject => StatusEvent::Reject,
        ModerationAction::Complete => StatusEvent::Complete,
        ModerationAction::Hide => {
            return if pin.is_active {
                Ok(PinPatch::visibility(false))
            } else {
                Err(TransitionError::AlreadyHidden)
            };
        }
        ModerationAction::Unhide => {
            return if pin.is_active {
                Err(TransitionError::NotHidden)
            } else {
                Ok(PinPatch::visibility(true))
            };
        }
    };

    pin.status
        .on_event(event)
        .map(PinPatch::status)
        .ok_or(TransitionError::IllegalStatus {
            action,
            status: pin.status,
        })
}

/// Applies admin decisions to pins and profiles.
#[derive(Clone)]
pub struct ModerationService {
    db: Arc<dyn Database>,
    notifier: ChangeNotifier,
}

impl ModerationService {
    pub fn new(db: Arc<dyn Database>, notifier: ChangeNotifier) -> Self {
        Self { db, notifier }
    }

    /// Apply a moderation action to a pin and return the updated pin.
    pub async fn apply(
        &self,
        actor: &SessionContext,
        pin_id: Uuid,
        action: ModerationAction,
    ) -> Result<ReliefPin> {
        let pin = self
            .db
            .get_pin(pin_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pin {} not found", pin_id)))?;

        let patch = plan_transition(&pin, action).inspect_err(|err| {
            tracing::info!(
                pin_id = %pin_id,
                admin = %actor.user_id,
                action = action.as_str(),
                reason = %err,
                "Moderation action rejected"
            );
        })?;

        let updated = self
            .db
            .update_pin(pin_id, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pin {} not found", pin_id)))?;

        tracing::info!(
            pin_id = %pin_id,
            admin = %actor.user_id,
            action = action.as_str(),
            from = pin.status.as_str(),
            to = updated.status.as_str(),
            is_active = updated.is_active,
            "Moderation action applied"
        );

        self.notifier.publish(ChangeKind::Update, Some(pin_id));
        Ok(updated)
    }

    /// Permanently remove a pin.
    pub async fn delete(&self, actor: &SessionContext, pin_id: Uuid) -> Result<()> {
        if !self.db.delete_pin(pin_id).await? {
            return Err(AppError::NotFound(format!("Pin {} not found", pin_id)));
        }

        tracing::info!(pin_id = %pin_id, admin = %actor.user_id, "Pin deleted");
        self.notifier.publish(ChangeKind::Delete, Some(pin_id));
        Ok(())
    }

    /// Flip a user's role between public and admin.
    pub async fn toggle_role(&self, actor: &SessionContext, target_id: &str) -> Result<UserProfile> {
        let target = self.load_other_profile(actor, target_id, "role").await?;
        let patch = ProfilePatch {
            role: Some(target.role.toggled()),
            ..ProfilePatch::default()
        };
        let updated = self.write_profile(target_id, &patch).await?;

        tracing::info!(
            user_id = target_id,
            admin = %actor.user_id,
            role = updated.role.as_str(),
            "User role changed"
        );
        Ok(updated)
    }

    /// Flip a user's active flag.
    pub async fn toggle_active(
        &self,
        actor: &SessionContext,
        target_id: &str,
    ) -> Result<UserProfile> {
        let target = self.load_other_profile(actor, target_id, "active flag").await?;
        let patch = ProfilePatch {
            is_active: Some(!target.is_active),
            ..ProfilePatch::default()
        };
        let updated = self.write_profile(target_id, &patch).await?;

        tracing::info!(
            user_id = target_id,
            admin = %actor.user_id,
            is_active = updated.is_active,
            "User active flag changed"
        );
        Ok(updated)
    }

    /// Load a profile that is not the actor's own.
    async fn load_other_profile(
        &self,
        actor: &SessionContext,
        target_id: &str,
        field: &str,
    ) -> Result<UserProfile> {
        if actor.user_id == target_id {
            tracing::warn!(user_id = target_id, field, "Blocked self-service profile change");
            return Err(AppError::Conflict(format!("You cannot change your own {}", field)));
        }

        self.db
            .get_profile(target_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", target_id)))
    }

    async fn write_profile(&self, target_id: &str, patch: &ProfilePatch) -> Result<UserProfile> {
        self.db
            .update_profile(target_id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", target_id)))
    }
}
