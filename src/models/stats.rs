//! Count summaries derived from a single fetched set.
//!
//! Dashboards never issue per-count queries: the pins (and profiles) are
//! fetched once and every number is derived from that set.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{PinStatus, ReliefPin, Role, UserProfile};

/// Counts shown on a user's dashboard, over their visible pins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardStats {
    pub total: u32,
    pub approved: u32,
    pub pending: u32,
    /// Pins submitted by the viewer
    pub mine: u32,
}

impl DashboardStats {
    pub fn from_pins<'a>(pins: impl IntoIterator<Item = &'a ReliefPin>, viewer_id: &str) -> Self {
        let mut stats = Self::default();
        for pin in pins {
            stats.total += 1;
            match pin.status {
                PinStatus::Approved => stats.approved += 1,
                PinStatus::Pending => stats.pending += 1,
                PinStatus::Rejected | PinStatus::Completed => {}
            }
            if pin.is_owned_by(viewer_id) {
                stats.mine += 1;
            }
        }
        stats
    }
}

/// Counts shown on the admin console, over every pin and profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AdminStats {
    pub total_pins: u32,
    pub pending_pins: u32,
    pub approved_pins: u32,
    pub completed_pins: u32,
    pub rejected_pins: u32,
    /// Pins with `is_active = false`, counted regardless of status
    pub hidden_pins: u32,
    pub total_users: u32,
    pub active_users: u32,
    pub admins: u32,
}

impl AdminStats {
    pub fn from_sets(pins: &[ReliefPin], users: &[UserProfile]) -> Self {
        let mut stats = Self {
            total_pins: pins.len() as u32,
            total_users: users.len() as u32,
            ..Self::default()
        };

        for pin in pins {
            match pin.status {
                PinStatus::Pending => stats.pending_pins += 1,
                PinStatus::Approved => stats.approved_pins += 1,
                PinStatus::Completed => stats.completed_pins += 1,
                PinStatus::Rejected => stats.rejected_pins += 1,
            }
            if !pin.is_active {
                stats.hidden_pins += 1;
            }
        }

        for user in users {
            if user.is_active {
                stats.active_users += 1;
            }
            if user.role == Role::Admin {
                stats.admins += 1;
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PinContent, ReliefType};
    use chrono::Utc;

    fn make_pin(owner: &str, status: PinStatus, is_active: bool) -> ReliefPin {
        let mut pin = ReliefPin::new(
            owner,
            PinContent {
                latitude: 10.3,
                longitude: 123.9,
                location_name: "Gym".to_string(),
                relief_type: ReliefType::Water,
                description: "Water refill".to_string(),
                photo_url: None,
                start_datetime: None,
                end_datetime: None,
            },
            status,
            Utc::now(),
        );
        pin.is_active = is_active;
        pin
    }

    #[test]
    fn test_dashboard_counts() {
        let pins = vec![
            make_pin("me", PinStatus::Pending, true),
            make_pin("me", PinStatus::Approved, true),
            make_pin("other", PinStatus::Approved, true),
            make_pin("me", PinStatus::Rejected, true),
        ];

        let stats = DashboardStats::from_pins(&pins, "me");

        assert_eq!(stats.total, 4);
        assert_eq!(stats.approved, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.mine, 3);
    }

    #[test]
    fn test_admin_counts_include_hidden() {
        let pins = vec![
            make_pin("a", PinStatus::Pending, true),
            make_pin("a", PinStatus::Completed, false),
            make_pin("b", PinStatus::Approved, false),
        ];
        let now = Utc::now();
        let mut admin = UserProfile::new_public("admin", "admin@example.com", now);
        admin.role = Role::Admin;
        let mut inactive = UserProfile::new_public("b", "b@example.com", now);
        inactive.is_active = false;
        let users = vec![admin, inactive, UserProfile::new_public("a", "a@example.com", now)];

        let stats = AdminStats::from_sets(&pins, &users);

        assert_eq!(stats.total_pins, 3);
        assert_eq!(stats.pending_pins, 1);
        assert_eq!(stats.completed_pins, 1);
        assert_eq!(stats.approved_pins, 1);
        assert_eq!(stats.hidden_pins, 2);
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.active_users, 2);
        assert_eq!(stats.admins, 1);
    }
}
