// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process database backend.
//!
//! Implements the same contract as Firestore over concurrent maps. Used for
//! local development (`DATABASE_BACKEND=memory`) and tests. Like the hosted
//! store there is no locking across calls: concurrent writers race and the
//! last write wins.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::db::{matches_all, sort_newest_first, Database, PinFilter};
use crate::error::AppError;
use crate::models::{PinPatch, PinStatus, ProfilePatch, ReliefPin, UserProfile};

/// Process-local database.
#[derive(Clone, Default)]
pub struct MemoryDb {
    pins: Arc<DashMap<Uuid, ReliefPin>>,
    profiles: Arc<DashMap<String, UserProfile>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }
}

#[async_trait]
impl Database for MemoryDb {
    async fn insert_pin(&self, pin: &ReliefPin) -> Result<(), AppError> {
        self.pins.insert(pin.id, pin.clone());
        Ok(())
    }

    async fn get_pin(&self, id: Uuid) -> Result<Option<ReliefPin>, AppError> {
        Ok(self.pins.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_pins(&self, filters: &[PinFilter]) -> Result<Vec<ReliefPin>, AppError> {
        let mut pins: Vec<ReliefPin> = self
            .pins
            .iter()
            .filter(|entry| matches_all(filters, entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        sort_newest_first(&mut pins);
        Ok(pins)
    }

    async fn update_pin(
        &self,
        id: Uuid,
        patch: &PinPatch,
    ) -> Result<Option<ReliefPin>, AppError> {
        let now = Utc::now();
        Ok(self.pins.get_mut(&id).map(|mut entry| {
            patch.apply_to(entry.value_mut(), now);
            entry.value().clone()
        }))
    }

    async fn delete_pin(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.pins.remove(&id).is_some())
    }

    async fn complete_pins(&self, ids: &[Uuid], now: DateTime<Utc>) -> Result<usize, AppError> {
        let mut written = 0;
        for id in ids {
            if let Some(mut entry) = self.pins.get_mut(id) {
                // Re-check under the entry lock; an edit may have landed since the query.
                if let Some(status) = entry.expired_status(now) {
                    PinPatch::status(status).apply_to(entry.value_mut(), Utc::now());
                    written += 1;
                }
            }
        }
        Ok(written)
    }

    async fn get_profile(&self, id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.profiles.get(id).map(|entry| entry.value().clone()))
    }

    async fn insert_profile_if_absent(
        &self,
        profile: &UserProfile,
    ) -> Result<UserProfile, AppError> {
        Ok(self
            .profiles
            .entry(profile.id.clone())
            .or_insert_with(|| profile.clone())
            .value()
            .clone())
    }

    async fn get_profiles(&self, ids: &[String]) -> Result<Vec<UserProfile>, AppError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.profiles.get(id).map(|entry| entry.value().clone()))
            .collect())
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, AppError> {
        let mut profiles: Vec<UserProfile> = self
            .profiles
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(profiles)
    }

    async fn update_profile(
        &self,
        id: &str,
        patch: &ProfilePatch,
    ) -> Result<Option<UserProfile>, AppError> {
        let now = Utc::now();
        Ok(self.profiles.get_mut(id).map(|mut entry| {
            patch.apply_to(entry.value_mut(), now);
            entry.value().clone()
        }))
    }
}
