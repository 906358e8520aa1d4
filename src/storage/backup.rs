//! Background backup worker
//!
//! Long-lived task that wakes on a fixed interval, snapshots the database
//! file through the codec and ships it to the object store. Failures never
//! escape the task: every cycle error degrades to a cooldown-and-retry so
//! the bot's main loop stays unaffected for the lifetime of the process.
//!
//! Cycle states: Idle -> Precheck -> Capturing -> Uploading -> Idle, with
//! any failure routing through Cooldown. Prechecks that fail (no store
//! credentials, no database file) are skips, not errors — backups are an
//! optional feature.

use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::core::config;
use crate::core::error::BackupError;
use crate::storage::object_store::{ObjectStoreClient, StoreLocation};
use crate::storage::snapshot;

/// Source of the store location, queried anew on every cycle.
///
/// Indirection exists so the worker re-reads the environment each interval
/// (credentials can appear or rotate without a restart) and so tests can
/// inject a fixture pointing at a mock server.
pub type LocationProvider = Arc<dyn Fn() -> Option<StoreLocation> + Send + Sync>;

/// Worker timing and paths
#[derive(Debug, Clone)]
pub struct BackupSettings {
    /// Local database file to snapshot
    pub source_path: PathBuf,
    /// Directory for the transient compressed blob
    pub temp_dir: PathBuf,
    /// Wall-clock interval between backup attempts
    pub interval: Duration,
    /// Wait before re-attempting after a failed cycle
    pub cooldown: Duration,
}

impl BackupSettings {
    pub fn from_env() -> Self {
        BackupSettings {
            source_path: PathBuf::from(config::DATABASE_PATH.as_str()),
            temp_dir: std::env::temp_dir(),
            interval: config::backup::interval(),
            cooldown: config::backup::cooldown(),
        }
    }
}

/// What a single backup cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Store credentials absent — feature disabled, no network call made
    NotConfigured,
    /// Database file absent at precheck — nothing to capture
    SourceMissing,
    /// Snapshot uploaded under this object key
    Uploaded(String),
}

pub struct BackupWorker {
    settings: BackupSettings,
    location: LocationProvider,
    cancel: CancellationToken,
}

impl BackupWorker {
    pub fn new(settings: BackupSettings, location: LocationProvider, cancel: CancellationToken) -> Self {
        Self {
            settings,
            location,
            cancel,
        }
    }

    /// Worker reading its settings and store location from the environment
    pub fn from_env(cancel: CancellationToken) -> Self {
        Self::new(BackupSettings::from_env(), Arc::new(StoreLocation::from_env), cancel)
    }

    /// Runs the backup loop until the cancellation token fires.
    ///
    /// The schedule is deliberately simple: sleep the full interval, then
    /// attempt. No jitter, no catch-up on missed ticks — the operation is
    /// idempotent and low-frequency. After a failure the worker re-attempts
    /// once per cooldown period until a cycle succeeds or skips, then
    /// returns to the main interval.
    pub async fn run(self) {
        log::info!(
            "📦 Backup worker started (interval: {}s, cooldown: {}s, source: {})",
            self.settings.interval.as_secs(),
            self.settings.cooldown.as_secs(),
            self.settings.source_path.display()
        );

        loop {
            // Idle
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = sleep(self.settings.interval) => {}
            }

            // Cooldown-and-retry until the cycle succeeds or skips
            loop {
                match self.backup_once().await {
                    Ok(CycleOutcome::Uploaded(name)) => {
                        log::info!("✅ Backup uploaded: {}", name);
                        break;
                    }
                    Ok(CycleOutcome::NotConfigured) => {
                        log::debug!("Backups disabled (store credentials not set), skipping");
                        break;
                    }
                    Ok(CycleOutcome::SourceMissing) => {
                        log::warn!(
                            "Database file {} not found, skipping backup",
                            self.settings.source_path.display()
                        );
                        break;
                    }
                    Err(e) => {
                        log::error!(
                            "❌ Backup failed: {}. Re-attempting in {}s",
                            e,
                            self.settings.cooldown.as_secs()
                        );
                        tokio::select! {
                            _ = self.cancel.cancelled() => {
                                log::info!("Backup worker stopped");
                                return;
                            }
                            _ = sleep(self.settings.cooldown) => {}
                        }
                    }
                }
            }
        }

        log::info!("Backup worker stopped");
    }

    /// One full backup cycle: precheck, capture, upload, cleanup.
    ///
    /// The temporary blob is removed whether or not the upload succeeded; a
    /// failed removal is logged and does not change the outcome.
    pub async fn backup_once(&self) -> Result<CycleOutcome, BackupError> {
        // Precheck: store configured?
        let Some(location) = (self.location)() else {
            return Ok(CycleOutcome::NotConfigured);
        };

        // Precheck: source file present?
        if !self.settings.source_path.exists() {
            return Ok(CycleOutcome::SourceMissing);
        }

        // Capturing
        let name = snapshot::snapshot_name(Utc::now());
        let blob_path = self.settings.temp_dir.join(&name);
        snapshot::compress(&self.settings.source_path, &blob_path)?;

        // Uploading
        let client = ObjectStoreClient::new(&location)?;
        let upload_result = client.upload(&blob_path, &name).await;

        if let Err(e) = fs::remove_file(&blob_path) {
            log::warn!("Failed to remove temporary blob {}: {}", blob_path.display(), e);
        }

        upload_result?;
        Ok(CycleOutcome::Uploaded(name))
    }
}

/// Spawns the backup worker as an independent task owned by the caller.
///
/// The returned handle joins once the token is cancelled and the current
/// wait (or in-flight cycle, bounded by the request timeout) finishes.
pub fn spawn_backup_worker(
    settings: BackupSettings,
    location: LocationProvider,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(BackupWorker::new(settings, location, cancel).run())
}
