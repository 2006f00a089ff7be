// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Relief Map API Server
//!
//! Serves relief pin submission, moderation and map visibility for
//! authenticated users.

use relief_map::{
    config::{Config, DatabaseBackend},
    db::{Database, FirestoreDb, MemoryDb},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        policy = ?config.moderation_policy,
        backend = ?config.database_backend,
        "Starting Relief Map API"
    );

    let db: Arc<dyn Database> = match config.database_backend {
        DatabaseBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        DatabaseBackend::Memory => {
            tracing::warn!("Using in-memory database; data is lost on restart");
            Arc::new(MemoryDb::new())
        }
    };

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db));

    // Build router
    let app = relief_map::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("relief_map=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
