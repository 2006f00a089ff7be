// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auto-completion of approved pins whose relief window has ended.
//!
//! The sweep is best-effort: failures are logged and reported through
//! [`SweepReport::Failed`], never raised to the caller. It is idempotent
//! because completed pins no longer match the query.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{Database, PinFilter};
use crate::models::PinStatus;
use crate::services::notifier::{ChangeKind, ChangeNotifier};

/// Outcome of one sweep. Callers are free to ignore it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum SweepReport {
    /// `count` pins moved from approved to completed (zero is fine).
    Completed { count: usize },
    Failed { reason: String },
}

impl SweepReport {
    /// Number of pins transitioned; zero for a failed sweep.
    pub fn count(&self) -> usize {
        match self {
            SweepReport::Completed { count } => *count,
            SweepReport::Failed { .. } => 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SweepReport::Failed { .. })
    }
}

#[derive(Clone)]
pub struct Sweeper {
    db: Arc<dyn Database>,
    notifier: ChangeNotifier,
}

impl Sweeper {
    pub fn new(db: Arc<dyn Database>, notifier: ChangeNotifier) -> Self {
        Self { db, notifier }
    }

    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(Utc::now()).await
    }

    /// Complete every approved pin whose `end_datetime` is before `now`.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let filters = [
            PinFilter::Status(PinStatus::Approved),
            PinFilter::EndsBefore(now),
        ];

        let candidates = match self.db.list_pins(&filters).await {
            Ok(pins) => pins,
            Err(e) => {
                tracing::warn!(error = %e, "Sweep query failed; continuing without it");
                return SweepReport::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let expired: Vec<Uuid> = candidates
            .iter()
            .filter(|pin| pin.is_expired(now))
            .map(|pin| pin.id)
            .collect();

        if expired.is_empty() {
            tracing::debug!("Sweep found no expired pins");
            return SweepReport::Completed { count: 0 };
        }

        match self.db.complete_pins(&expired, now).await {
            Ok(count) => {
                tracing::info!(count, "Auto-completed expired pins");
                if count > 0 {
                    self.notifier.publish(ChangeKind::Update, None);
                }
                SweepReport::Completed { count }
            }
            Err(e) => {
                tracing::warn!(error = %e, matched = expired.len(), "Sweep update failed");
                SweepReport::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
