//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::models::PinStatus;

/// How new and edited pins enter the moderation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationPolicy {
    /// Submissions start at `pending` and wait for an admin.
    Strict,
    /// Submissions are approved on arrival; a relief window is mandatory.
    Trusted,
}

impl ModerationPolicy {
    /// Status assigned to a pin when it is created or edited.
    pub fn initial_status(self) -> PinStatus {
        match self {
            ModerationPolicy::Strict => PinStatus::Pending,
            ModerationPolicy::Trusted => PinStatus::Approved,
        }
    }

    /// Whether start/end datetimes must accompany a submission.
    pub fn requires_window(self) -> bool {
        match self {
            ModerationPolicy::Strict => false,
            ModerationPolicy::Trusted => true,
        }
    }
}

impl FromStr for ModerationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ModerationPolicy::Strict),
            "trusted" => Ok(ModerationPolicy::Trusted),
            other => Err(ConfigError::Invalid {
                name: "MODERATION_POLICY",
                value: other.to_string(),
            }),
        }
    }
}

/// Which persistence backend serves the pin and profile collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Firestore,
    Memory,
}

impl FromStr for DatabaseBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(DatabaseBackend::Firestore),
            "memory" => Ok(DatabaseBackend::Memory),
            other => Err(ConfigError::Invalid {
                name: "DATABASE_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    pub database_backend: DatabaseBackend,
    pub moderation_policy: ModerationPolicy,

    // --- Object storage ---
    /// Base URL of the storage API
    pub storage_url: String,
    pub storage_bucket: String,
    pub storage_api_key: String,
    pub upload_timeout: Duration,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Fixed configuration for tests.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            database_backend: DatabaseBackend::Memory,
            moderation_policy: ModerationPolicy::Strict,
            storage_url: "http://storage.test".to_string(),
            storage_bucket: "relief-photos".to_string(),
            storage_api_key: "test_storage_key".to_string(),
            upload_timeout: Duration::from_secs(5),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            database_backend: env::var("DATABASE_BACKEND")
                .unwrap_or_else(|_| "firestore".to_string())
                .parse()?,
            moderation_policy: env::var("MODERATION_POLICY")
                .unwrap_or_else(|_| "strict".to_string())
                .parse()?,

            storage_url: env::var("STORAGE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:54321".to_string()),
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| "relief-photos".to_string()),
            storage_api_key: env::var("STORAGE_API_KEY")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            upload_timeout: Duration::from_secs(
                env::var("UPLOAD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
