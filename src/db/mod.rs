//! Database layer (Firestore, with an in-process backend for local runs).

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use memory::MemoryDb;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{PinPatch, PinStatus, ProfilePatch, ReliefPin, UserProfile};

/// Collection names as constants.
pub mod collections {
    pub const RELIEF_PINS: &str = "relief_pins";
    pub const USER_PROFILES: &str = "user_profiles";
}

/// One condition of a pin listing. A listing matches the conjunction of its filters.
#[derive(Debug, Clone, PartialEq)]
pub enum PinFilter {
    IsActive(bool),
    Status(PinStatus),
    StatusNot(PinStatus),
    Owner(String),
    /// `end_datetime` is set and earlier than the given instant.
    EndsBefore(DateTime<Utc>),
    /// At least one of the nested filters holds.
    AnyOf(Vec<PinFilter>),
}

impl PinFilter {
    pub fn matches(&self, pin: &ReliefPin) -> bool {
        match self {
            PinFilter::IsActive(active) => pin.is_active == *active,
            PinFilter::Status(status) => pin.status == *status,
            PinFilter::StatusNot(status) => pin.status != *status,
            PinFilter::Owner(user_id) => pin.user_id == *user_id,
            PinFilter::EndsBefore(instant) => pin.end_datetime.is_some_and(|end| end < *instant),
            PinFilter::AnyOf(filters) => filters.iter().any(|f| f.matches(pin)),
        }
    }

    /// Whether every condition in this filter is an equality test.
    pub fn is_equality(&self) -> bool {
        match self {
            PinFilter::IsActive(_) | PinFilter::Status(_) | PinFilter::Owner(_) => true,
            PinFilter::StatusNot(_) | PinFilter::EndsBefore(_) => false,
            PinFilter::AnyOf(filters) => filters.iter().all(PinFilter::is_equality),
        }
    }
}

/// Check a pin against every filter of a listing.
pub fn matches_all(filters: &[PinFilter], pin: &ReliefPin) -> bool {
    filters.iter().all(|f| f.matches(pin))
}

/// Listing order: creation time, newest first (id breaks ties).
pub fn sort_newest_first(pins: &mut [ReliefPin]) {
    pins.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Persistence gateway over the pin and profile collections.
#[async_trait]
pub trait Database: Send + Sync {
    // ─── Pins ────────────────────────────────────────────────────

    async fn insert_pin(&self, pin: &ReliefPin) -> Result<(), AppError>;

    async fn get_pin(&self, id: Uuid) -> Result<Option<ReliefPin>, AppError>;

    /// Pins matching all `filters`, newest first.
    async fn list_pins(&self, filters: &[PinFilter]) -> Result<Vec<ReliefPin>, AppError>;

    /// Write only the patched fields. Returns the updated pin, or `None` if absent.
    async fn update_pin(&self, id: Uuid, patch: &PinPatch)
        -> Result<Option<ReliefPin>, AppError>;

    /// Delete a pin. Returns whether it existed.
    async fn delete_pin(&self, id: Uuid) -> Result<bool, AppError>;

    /// Batched transition of the given pins to `completed`.
    ///
    /// Each pin is re-read at write time and only completed if it is still
    /// expired at `now` (approved, window ended). Ids that no longer exist or
    /// no longer qualify are skipped. Returns the number of pins written.
    async fn complete_pins(&self, ids: &[Uuid], now: DateTime<Utc>) -> Result<usize, AppError>;

    // ─── Profiles ────────────────────────────────────────────────

    async fn get_profile(&self, id: &str) -> Result<Option<UserProfile>, AppError>;

    /// Store `profile` unless one already exists for its id; returns the stored profile.
    async fn insert_profile_if_absent(&self, profile: &UserProfile)
        -> Result<UserProfile, AppError>;

    /// Profiles for the given ids; ids without a profile are left out.
    async fn get_profiles(&self, ids: &[String]) -> Result<Vec<UserProfile>, AppError>;

    /// All profiles, newest first.
    async fn list_profiles(&self) -> Result<Vec<UserProfile>, AppError>;

    async fn update_profile(
        &self,
        id: &str,
        patch: &ProfilePatch,
    ) -> Result<Option<UserProfile>, AppError>;
}
