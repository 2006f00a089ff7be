// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod map;
pub mod moderation;
pub mod notifier;
pub mod session;
pub mod storage;
pub mod submission;
pub mod sweeper;
pub mod visibility;

pub use moderation::{ModerationAction, ModerationService, TransitionError};
pub use notifier::{ChangeKind, ChangeNotifier, PinChangeEvent};
pub use session::SessionService;
pub use storage::PhotoStorage;
pub use submission::{PinInput, SubmissionService};
pub use sweeper::{SweepReport, Sweeper};
pub use visibility::{BoundingBox, PinView, Scope, SessionContext, StatusFilter};
