// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session resolution for authenticated requests.
//!
//! Turns a verified token identity into a [`SessionContext`]:
//! - creates the profile on first sign-in
//! - rejects deactivated accounts
//! - runs the auto-completion sweep once per session, before any of the
//!   session's requests reach a handler

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::UserProfile;
use crate::services::sweeper::Sweeper;
use crate::services::visibility::SessionContext;

/// A session is one issued token: identity plus issue time.
type SessionKey = (String, u64);

struct SeenSession {
    first_seen: Instant,
    swept: Arc<OnceCell<()>>,
}

#[derive(Clone)]
pub struct SessionService {
    db: Arc<dyn Database>,
    sweeper: Sweeper,
    seen: Arc<DashMap<SessionKey, SeenSession>>,
    session_ttl: Duration,
}

impl SessionService {
    pub fn new(db: Arc<dyn Database>, sweeper: Sweeper, session_ttl: Duration) -> Self {
        Self {
            db,
            sweeper,
            seen: Arc::new(DashMap::new()),
            session_ttl,
        }
    }

    /// Resolve the session context for a verified identity.
    pub async fn attach(
        &self,
        user_id: &str,
        email: Option<&str>,
        issued_at: u64,
    ) -> Result<SessionContext> {
        let profile = self.ensure_profile(user_id, email).await?;

        if !profile.is_active {
            tracing::info!(user_id, "Rejected request from deactivated account");
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }

        self.sweep_once((user_id.to_string(), issued_at)).await;

        Ok(SessionContext::from_profile(&profile))
    }

    async fn ensure_profile(&self, user_id: &str, email: Option<&str>) -> Result<UserProfile> {
        if let Some(profile) = self.db.get_profile(user_id).await? {
            return Ok(profile);
        }

        let fresh = UserProfile::new_public(user_id, email.unwrap_or_default(), Utc::now());
        let stored = self.db.insert_profile_if_absent(&fresh).await?;
        tracing::info!(user_id, "Created profile on first sign-in");
        Ok(stored)
    }

    /// Run the sweep the first time `key` is seen. Concurrent first requests
    /// of the same session all wait for the one sweep.
    async fn sweep_once(&self, key: SessionKey) {
        if !self.seen.contains_key(&key) {
            self.prune_expired();
        }

        let swept = match self.seen.entry(key) {
            Entry::Occupied(entry) => entry.get().swept.clone(),
            Entry::Vacant(entry) => {
                let swept = Arc::new(OnceCell::new());
                entry.insert(SeenSession {
                    first_seen: Instant::now(),
                    swept: swept.clone(),
                });
                swept
            }
        };

        swept
            .get_or_init(|| async {
                let report = self.sweeper.sweep().await;
                tracing::debug!(?report, "Session start sweep finished");
            })
            .await;
    }

    fn prune_expired(&self) {
        let ttl = self.session_ttl;
        self.seen.retain(|_, session| session.first_seen.elapsed() < ttl);
    }

    /// Number of sessions currently remembered.
    pub fn tracked_sessions(&self) -> usize {
        self.seen.len()
    }
}
