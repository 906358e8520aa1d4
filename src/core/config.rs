use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Configuration constants for the bot

/// Path to the SQLite database file
/// Read from DATABASE_PATH environment variable
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "bot_database.db".to_string()));

/// Path to the log file
/// Read from LOG_FILE_PATH environment variable
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "podpiska.log".to_string()));

/// Backup scheduling configuration
pub mod backup {
    use super::{env, Duration};

    /// Interval between backup attempts (in seconds)
    pub const INTERVAL_SECS: u64 = 60 * 60; // 1 hour

    /// Wait after a failed backup cycle before re-attempting (in seconds)
    /// Shorter than the main interval so a transient failure does not cost
    /// a full hour, but long enough to never hot-loop against the store.
    pub const COOLDOWN_SECS: u64 = 5 * 60; // 5 minutes

    /// Backup interval duration, overridable via BACKUP_INTERVAL_SECS
    pub fn interval() -> Duration {
        let secs = env::var("BACKUP_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    /// Cooldown duration, overridable via BACKUP_COOLDOWN_SECS
    pub fn cooldown() -> Duration {
        let secs = env::var("BACKUP_COOLDOWN_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(COOLDOWN_SECS);
        Duration::from_secs(secs)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for object store HTTP calls (in seconds)
    /// Bounds how long the backup worker can sit in an upload, and the
    /// restore tool in a download, before the call is abandoned.
    pub const REQUEST_TIMEOUT_SECS: u64 = 300; // 5 minutes

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Graceful shutdown configuration
pub mod shutdown {
    use super::Duration;

    /// How long to wait for background tasks to finish after cancellation
    pub const JOIN_TIMEOUT_SECS: u64 = 5;

    pub fn join_timeout() -> Duration {
        Duration::from_secs(JOIN_TIMEOUT_SECS)
    }
}
