// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Relief Map: community tracking of disaster relief distribution points
//!
//! This crate provides the backend API for submitting geotagged relief pins,
//! moderating them, and deriving what each user may see on the map.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::sync::Arc;
use std::time::Duration;

use config::Config;
use db::Database;
use middleware::auth::TOKEN_LIFETIME_SECS;
use services::{
    ChangeNotifier, ModerationService, PhotoStorage, SessionService, SubmissionService, Sweeper,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Database>,
    pub notifier: ChangeNotifier,
    pub photos: PhotoStorage,
    pub submissions: SubmissionService,
    pub moderation: ModerationService,
    pub sweeper: Sweeper,
    pub sessions: SessionService,
}

impl AppState {
    /// Wire up every service over one database handle and change channel.
    pub fn new(config: Config, db: Arc<dyn Database>) -> Self {
        let notifier = ChangeNotifier::new();
        let photos = PhotoStorage::new(&config);
        let sweeper = Sweeper::new(db.clone(), notifier.clone());

        Self {
            submissions: SubmissionService::new(
                db.clone(),
                notifier.clone(),
                photos.clone(),
                config.moderation_policy,
            ),
            moderation: ModerationService::new(db.clone(), notifier.clone()),
            sessions: SessionService::new(
                db.clone(),
                sweeper.clone(),
                Duration::from_secs(TOKEN_LIFETIME_SECS),
            ),
            sweeper,
            photos,
            notifier,
            db,
            config,
        }
    }
}
