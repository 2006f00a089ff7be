// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Relief pins (`relief_pins`)
//! - User profiles (`user_profiles`)
//!
//! Equality filters are pushed down to Firestore; every listing is then
//! re-checked against the full filter set and sorted client-side, so range
//! and inequality conditions need no composite indexes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::select_filter_builder::FirestoreQueryFilterBuilder;
use firestore::{FirestoreConsistencySelector, FirestoreQueryFilter, FirestoreWritePrecondition};
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{collections, matches_all, sort_newest_first, Database, PinFilter};
use crate::error::AppError;
use crate::models::{PinPatch, PinStatus, ProfilePatch, ReliefPin, UserProfile};

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Fields written when the sweeper completes a pin.
#[derive(Serialize, Deserialize)]
struct CompletionUpdate {
    status: PinStatus,
    updated_at: DateTime<Utc>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }
}

/// Translate an equality filter into a Firestore query filter.
fn equality_filter(q: &FirestoreQueryFilterBuilder, filter: &PinFilter) -> Option<FirestoreQueryFilter> {
    match filter {
        PinFilter::IsActive(active) => q.field("is_active").eq(*active),
        PinFilter::Status(status) => q.field("status").eq(status.as_str()),
        PinFilter::Owner(user_id) => q.field("user_id").eq(user_id.as_str()),
        PinFilter::AnyOf(filters) => q.for_any(
            filters
                .iter()
                .map(|f| equality_filter(q, f))
                .collect::<Vec<_>>(),
        ),
        PinFilter::StatusNot(_) | PinFilter::EndsBefore(_) => None,
    }
}

#[async_trait]
impl Database for FirestoreDb {
    // ─── Pin Operations ──────────────────────────────────────────

    async fn insert_pin(&self, pin: &ReliefPin) -> Result<(), AppError> {
        let _: ReliefPin = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::RELIEF_PINS)
            .document_id(pin.id.to_string())
            .object(pin)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_pin(&self, id: Uuid) -> Result<Option<ReliefPin>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::RELIEF_PINS)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_pins(&self, filters: &[PinFilter]) -> Result<Vec<ReliefPin>, AppError> {
        let pushed: Vec<&PinFilter> = filters.iter().filter(|f| f.is_equality()).collect();

        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::RELIEF_PINS);

        let query = if pushed.is_empty() {
            query
        } else {
            query.filter(|q| {
                q.for_all(
                    pushed
                        .iter()
                        .map(|f| equality_filter(&q, f))
                        .collect::<Vec<_>>(),
                )
            })
        };

        let mut pins: Vec<ReliefPin> = query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        pins.retain(|pin| matches_all(filters, pin));
        sort_newest_first(&mut pins);
        Ok(pins)
    }

    async fn update_pin(
        &self,
        id: Uuid,
        patch: &PinPatch,
    ) -> Result<Option<ReliefPin>, AppError> {
        let Some(mut pin) = self.get_pin(id).await? else {
            return Ok(None);
        };
        patch.apply_to(&mut pin, Utc::now());

        // Only the patched paths are written; concurrent writers to other
        // fields are not clobbered.
        let updated: ReliefPin = self
            .get_client()?
            .fluent()
            .update()
            .fields(patch.field_paths())
            .in_col(collections::RELIEF_PINS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(id.to_string())
            .object(&pin)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some(updated))
    }

    async fn delete_pin(&self, id: Uuid) -> Result<bool, AppError> {
        if self.get_pin(id).await?.is_none() {
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::RELIEF_PINS)
            .document_id(id.to_string())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    async fn complete_pins(&self, ids: &[Uuid], now: DateTime<Utc>) -> Result<usize, AppError> {
        let client = self.get_client()?;
        let mut written = 0;

        for chunk in ids.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            // Reads through the transaction register each document for
            // conflict detection; a concurrent edit aborts the commit.
            let reader = client.clone_with_consistency_selector(
                FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone()),
            );

            let mut batch = 0;
            for id in chunk {
                let current: Option<ReliefPin> = reader
                    .fluent()
                    .select()
                    .by_id_in(collections::RELIEF_PINS)
                    .obj()
                    .one(&id.to_string())
                    .await
                    .map_err(|e| {
                        AppError::Database(format!("Failed to read pin {} in transaction: {}", id, e))
                    })?;

                let Some(status) = current.and_then(|pin| pin.expired_status(now)) else {
                    tracing::debug!(pin_id = %id, "Pin no longer due for completion, skipping");
                    continue;
                };

                let update = CompletionUpdate {
                    status,
                    updated_at: Utc::now(),
                };
                client
                    .fluent()
                    .update()
                    .fields(["status", "updated_at"])
                    .in_col(collections::RELIEF_PINS)
                    .precondition(FirestoreWritePrecondition::Exists(true))
                    .document_id(id.to_string())
                    .object(&update)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add completion to transaction for {}: {}",
                            id, e
                        ))
                    })?;
                batch += 1;
            }

            if batch == 0 {
                let _ = transaction.rollback().await;
                continue;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch completion: {}", e))
            })?;

            tracing::debug!(count = batch, "Committed completion batch");
            written += batch;
        }

        Ok(written)
    }

    // ─── Profile Operations ──────────────────────────────────────

    async fn get_profile(&self, id: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_PROFILES)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert_profile_if_absent(
        &self,
        profile: &UserProfile,
    ) -> Result<UserProfile, AppError> {
        if let Some(existing) = self.get_profile(&profile.id).await? {
            return Ok(existing);
        }

        let inserted: Result<UserProfile, _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USER_PROFILES)
            .document_id(&profile.id)
            .object(profile)
            .execute()
            .await;

        match inserted {
            Ok(stored) => Ok(stored),
            Err(e) => {
                // Another request may have created it between our read and insert.
                if let Some(existing) = self.get_profile(&profile.id).await? {
                    tracing::debug!(user_id = %profile.id, "Profile created concurrently");
                    return Ok(existing);
                }
                Err(AppError::Database(e.to_string()))
            }
        }
    }

    async fn get_profiles(&self, ids: &[String]) -> Result<Vec<UserProfile>, AppError> {
        let lookups: Vec<_> = ids.iter().map(|id| self.get_profile(id)).collect();
        let found = stream::iter(lookups)
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<UserProfile>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(found.into_iter().flatten().collect())
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, AppError> {
        let mut profiles: Vec<UserProfile> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USER_PROFILES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(profiles)
    }

    async fn update_profile(
        &self,
        id: &str,
        patch: &ProfilePatch,
    ) -> Result<Option<UserProfile>, AppError> {
        let Some(mut profile) = self.get_profile(id).await? else {
            return Ok(None);
        };
        patch.apply_to(&mut profile, Utc::now());

        let updated: UserProfile = self
            .get_client()?
            .fluent()
            .update()
            .fields(patch.field_paths())
            .in_col(collections::USER_PROFILES)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(id)
            .object(&profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some(updated))
    }
}
