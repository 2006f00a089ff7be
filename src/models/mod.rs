// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod pin;
pub mod stats;
pub mod user;

pub use pin::{PinContent, PinPatch, PinStatus, ReliefPin, ReliefType, StatusEvent};
pub use stats::{AdminStats, DashboardStats};
pub use user::{ProfilePatch, Role, UserProfile};
