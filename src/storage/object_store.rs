//! Object store client for S3-compatible backup storage
//!
//! Requests are built and presigned with rusty-s3 and executed over the
//! shared reqwest client; path-style addressing works with Backblaze B2,
//! MinIO and plain S3 alike. The client carries no retry logic — the backup
//! worker owns the cooldown-and-retry policy, the restore tool surfaces
//! failures directly to the operator.

use chrono::{DateTime, Utc};
use rusty_s3::actions::ListObjectsV2;
use rusty_s3::{Bucket, Credentials, S3Action, UrlStyle};
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::core::config;
use crate::core::error::BackupError;

/// Validity window for presigned request URLs
const SIGN_DURATION: Duration = Duration::from_secs(3600);

/// Default endpoint of the production bucket (Backblaze B2)
const DEFAULT_ENDPOINT: &str = "https://s3.us-west-002.backblazeb2.com";
const DEFAULT_REGION: &str = "us-west-002";
const DEFAULT_BUCKET: &str = "telegram-bot-backups";

/// Where backups live: endpoint + credentials + bucket.
///
/// Supplied through the environment and read once per operation, never
/// cached for the process lifetime, so rotating credentials or enabling
/// backups does not require a bot restart.
#[derive(Debug, Clone)]
pub struct StoreLocation {
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_key: String,
    pub bucket: String,
}

impl StoreLocation {
    /// Reads the store location from the environment.
    ///
    /// Returns `None` when either credential variable (B2_KEY_ID,
    /// B2_APPLICATION_KEY) is missing — backups are an optional feature and
    /// partial configuration disables them rather than erroring on every
    /// interval. Endpoint, region and bucket fall back to the production
    /// defaults.
    pub fn from_env() -> Option<Self> {
        let access_key_id = env::var("B2_KEY_ID").ok().filter(|s| !s.is_empty())?;
        let secret_key = env::var("B2_APPLICATION_KEY").ok().filter(|s| !s.is_empty())?;

        Some(StoreLocation {
            endpoint: env::var("B2_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            region: env::var("B2_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            access_key_id,
            secret_key,
            bucket: env::var("B2_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string()),
        })
    }
}

/// Metadata of one stored snapshot, as reported by the bucket listing.
///
/// `created_at` comes from the store's object metadata (LastModified), not
/// from parsing the name — it is the authoritative ordering key.
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    pub name: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// Thin wrapper over the S3 API: upload, download, list.
#[derive(Debug)]
pub struct ObjectStoreClient {
    bucket: Bucket,
    credentials: Credentials,
    http: reqwest::Client,
}

impl ObjectStoreClient {
    /// Builds a client for the given store location.
    ///
    /// Every network call made through this client is bounded by the
    /// configured request timeout, so the backup worker can never hang
    /// indefinitely inside an upload.
    pub fn new(location: &StoreLocation) -> Result<Self, BackupError> {
        let endpoint = location
            .endpoint
            .parse()
            .map_err(|e| BackupError::Config(format!("invalid endpoint URL '{}': {}", location.endpoint, e)))?;

        let bucket = Bucket::new(
            endpoint,
            UrlStyle::Path,
            location.bucket.clone(),
            location.region.clone(),
        )
        .map_err(|e| BackupError::Config(format!("failed to create bucket handle: {}", e)))?;

        let credentials = Credentials::new(&location.access_key_id, &location.secret_key);

        let http = reqwest::Client::builder()
            .timeout(config::network::timeout())
            .build()
            .map_err(|e| BackupError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            bucket,
            credentials,
            http,
        })
    }

    /// Uploads the file at `local_path` under object `key`.
    pub async fn upload(&self, local_path: &Path, key: &str) -> Result<(), BackupError> {
        let body = tokio::fs::read(local_path).await?;
        let url = self.bucket.put_object(Some(&self.credentials), key).sign(SIGN_DURATION);

        let response = self.http.put(url.as_str()).body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackupError::Transport(format!("PUT {} returned {}", key, status)));
        }

        Ok(())
    }

    /// Downloads object `key` into `local_path`.
    ///
    /// A missing key maps to `BackupError::NotFound`; `local_path` is only
    /// written after a successful response, so a failed download never
    /// leaves a partial file behind.
    pub async fn download(&self, key: &str, local_path: &Path) -> Result<(), BackupError> {
        let url = self.bucket.get_object(Some(&self.credentials), key).sign(SIGN_DURATION);

        let response = self.http.get(url.as_str()).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackupError::NotFound(key.to_string()));
        }
        if !status.is_success() {
            return Err(BackupError::Transport(format!("GET {} returned {}", key, status)));
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(local_path, &bytes).await?;

        Ok(())
    }

    /// Enumerates all objects in the bucket.
    ///
    /// Follows continuation tokens until the listing is exhausted — a
    /// truncated listing would silently hide older backups from the restore
    /// tool. An empty bucket yields an empty vec, not an error. No ordering
    /// is applied here; callers sort by `created_at`.
    pub async fn list(&self) -> Result<Vec<SnapshotInfo>, BackupError> {
        let mut snapshots = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut action = self.bucket.list_objects_v2(Some(&self.credentials));
            if let Some(ref token) = continuation_token {
                action.query_mut().insert("continuation-token", token.as_str());
            }
            let url = action.sign(SIGN_DURATION);

            let response = self.http.get(url.as_str()).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(BackupError::Transport(format!("LIST returned {}", status)));
            }

            let body = response.text().await?;
            let parsed = ListObjectsV2::parse_response(&body)
                .map_err(|e| BackupError::Transport(format!("failed to parse LIST response: {}", e)))?;

            for object in parsed.contents {
                let created_at = match DateTime::parse_from_rfc3339(&object.last_modified) {
                    Ok(dt) => dt.with_timezone(&Utc),
                    Err(e) => {
                        // Keep the entry rather than hide a backup; epoch sorts it last
                        log::warn!(
                            "Unparseable LastModified '{}' for {}: {}",
                            object.last_modified,
                            object.key,
                            e
                        );
                        DateTime::<Utc>::UNIX_EPOCH
                    }
                };

                snapshots.push(SnapshotInfo {
                    name: object.key,
                    size: object.size,
                    created_at,
                });
            }

            match parsed.next_continuation_token {
                Some(token) => continuation_token = Some(token),
                None => break,
            }
        }

        Ok(snapshots)
    }
}
