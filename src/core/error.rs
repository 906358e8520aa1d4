use std::path::PathBuf;
use thiserror::Error;

/// Errors from the backup-and-restore pipeline
///
/// Absent credentials are deliberately NOT an error: `StoreLocation::from_env`
/// returns `None` and the worker treats backups as a disabled feature.
/// Likewise a failed verification of a restored file is only logged — the
/// file stays on disk for inspection.
#[derive(Error, Debug)]
pub enum BackupError {
    /// Source database file was absent at capture time (skip, not fatal)
    #[error("source database file not found: {}", .0.display())]
    SourceMissing(PathBuf),

    /// Network or auth failure talking to the object store
    #[error("object store transport error: {0}")]
    Transport(String),

    /// Requested snapshot key does not exist in the bucket
    #[error("snapshot not found in bucket: {0}")]
    NotFound(String),

    /// Bucket listing was empty when restoring the latest snapshot
    #[error("no backups found in bucket")]
    NoBackupsFound,

    /// Store location could not be turned into a usable client
    #[error("invalid store configuration: {0}")]
    Config(String),

    /// Local filesystem errors (compress/decompress/temp blob handling)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for BackupError {
    fn from(err: reqwest::Error) -> Self {
        BackupError::Transport(err.to_string())
    }
}
