// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Object storage client for pin photos.
//!
//! Photos are staged before the pin that references them is written; a pin
//! only ever stores the public URL issued here.

use axum::body::Bytes;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::config::Config;
use crate::error::AppError;

/// Largest accepted photo upload.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Accepted photo file extensions (lowercase).
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "gif", "heic"];

/// Folder inside the bucket holding pin photos.
const PHOTO_FOLDER: &str = "relief-photos";

/// Storage REST client.
#[derive(Clone)]
pub struct PhotoStorage {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
    api_key: String,
    upload_timeout: Duration,
}

impl PhotoStorage {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.storage_url.trim_end_matches('/').to_string(),
            bucket: config.storage_bucket.clone(),
            api_key: config.storage_api_key.clone(),
            upload_timeout: config.upload_timeout,
        }
    }

    /// Object key for a photo uploaded by `user_id` at `now`.
    ///
    /// The user id is encoded so it always stays a single path segment.
    pub fn photo_key(user_id: &str, extension: &str, now: DateTime<Utc>) -> String {
        format!(
            "{}/{}-{}.{}",
            PHOTO_FOLDER,
            urlencoding::encode(user_id),
            now.timestamp_millis(),
            extension
        )
    }

    /// Publicly resolvable URL of an object key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}{}", self.public_prefix(), encode_key(key))
    }

    /// Whether `url` is a reference issued by this storage.
    pub fn owns_reference(&self, url: &str) -> bool {
        url.strip_prefix(&self.public_prefix())
            .is_some_and(|rest| !rest.is_empty() && !rest.contains(".."))
    }

    fn public_prefix(&self) -> String {
        format!(
            "{}/storage/v1/object/public/{}/",
            self.base_url,
            urlencoding::encode(&self.bucket)
        )
    }

    /// Upload a photo for `user_id` and return its public URL.
    pub async fn upload_photo(
        &self,
        user_id: &str,
        extension: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<String, AppError> {
        let extension = normalize_extension(extension)?;

        if !content_type.starts_with("image/") {
            return Err(AppError::Validation(format!(
                "Photo content type must be image/*, got '{}'",
                content_type
            )));
        }
        if body.is_empty() {
            return Err(AppError::Validation("Photo is empty".to_string()));
        }
        if body.len() > MAX_PHOTO_BYTES {
            return Err(AppError::Validation(format!(
                "Photo exceeds the {} MiB limit",
                MAX_PHOTO_BYTES / (1024 * 1024)
            )));
        }

        let key = Self::photo_key(user_id, extension, Utc::now());
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            urlencoding::encode(&self.bucket),
            encode_key(&key)
        );
        let size = body.len();

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .timeout(self.upload_timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Storage("Photo upload timed out".to_string())
                } else {
                    AppError::Storage(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, key = %key, "Photo upload rejected");
            return Err(AppError::Storage(format!("HTTP {}: {}", status, body)));
        }

        tracing::info!(user_id, key = %key, size, "Photo uploaded");
        Ok(self.public_url(&key))
    }
}

/// Validate and lowercase a photo file extension.
pub fn normalize_extension(extension: &str) -> Result<&'static str, AppError> {
    let lower = extension.trim().trim_start_matches('.').to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .iter()
        .find(|allowed| **allowed == lower)
        .copied()
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Unsupported photo type '{}'; expected one of {}",
                extension,
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })
}

/// URL-encode each path segment of an object key.
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn storage() -> PhotoStorage {
        PhotoStorage::new(&Config::test_default())
    }

    #[test]
    fn test_photo_key_format() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            PhotoStorage::photo_key("user-1", "jpg", now),
            "relief-photos/user-1-1700000000123.jpg"
        );
    }

    #[test]
    fn test_photo_key_keeps_user_in_one_segment() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let key = PhotoStorage::photo_key("google/oauth|42", "png", now);

        assert_eq!(key.matches('/').count(), 1);
        assert!(key.starts_with("relief-photos/google%2Foauth%7C42-"));

        let url = storage().public_url(&key);
        let object = url
            .strip_prefix("http://storage.test/storage/v1/object/public/relief-photos/")
            .unwrap();
        assert_eq!(object.matches('/').count(), 1);
    }

    #[test]
    fn test_public_url_encodes_segments() {
        let url = storage().public_url("relief-photos/a b-1.png");
        assert_eq!(
            url,
            "http://storage.test/storage/v1/object/public/relief-photos/relief-photos/a%20b-1.png"
        );
    }

    #[test]
    fn test_owns_reference() {
        let storage = storage();
        let issued = storage.public_url("relief-photos/u-1.jpg");
        assert!(storage.owns_reference(&issued));
        assert!(!storage.owns_reference("https://evil.example/photo.jpg"));
        assert!(!storage.owns_reference(
            "http://storage.test/storage/v1/object/public/relief-photos/"
        ));
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("JPG").unwrap(), "jpg");
        assert_eq!(normalize_extension(".heic").unwrap(), "heic");
        assert!(matches!(
            normalize_extension("exe"),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_rejects_before_network() {
        let storage = storage();

        let err = storage
            .upload_photo("u", "png", "text/plain", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let too_big = Bytes::from(vec![0u8; MAX_PHOTO_BYTES + 1]);
        let err = storage
            .upload_photo("u", "png", "image/png", too_big)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unreachable_storage_is_storage_error() {
        let mut config = Config::test_default();
        config.storage_url = "http://127.0.0.1:1".to_string();
        let storage = PhotoStorage::new(&config);

        let err = storage
            .upload_photo("u", "jpg", "image/jpeg", Bytes::from_static(b"\xff\xd8"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }
}
