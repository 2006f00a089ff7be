//! User profile model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Public,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Public => "public",
            Role::Admin => "admin",
        }
    }

    pub fn toggled(self) -> Role {
        match self {
            Role::Public => Role::Admin,
            Role::Admin => Role::Public,
        }
    }
}

/// User profile stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    /// Authentication identity (also used as document ID)
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Profile created on first sign-in.
    pub fn new_public(id: impl Into<String>, email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            full_name: None,
            avatar_url: None,
            role: Role::Public,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Admin-side field update of a profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl ProfilePatch {
    pub fn apply_to(&self, profile: &mut UserProfile, now: DateTime<Utc>) {
        if let Some(role) = self.role {
            profile.role = role;
        }
        if let Some(is_active) = self.is_active {
            profile.is_active = is_active;
        }
        profile.updated_at = now;
    }

    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.role.is_some() {
            paths.push("role");
        }
        if self.is_active.is_some() {
            paths.push("is_active");
        }
        paths.push("updated_at");
        paths
    }
}
