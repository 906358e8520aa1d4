//! Podpiska - Telegram subscription bot with automatic S3 database backups
//!
//! The library is split into three areas:
//!
//! - `core`: configuration, errors, and logging
//! - `storage`: database glue plus the backup-and-restore pipeline
//!   (object store client, snapshot codec, backup worker, restore tool)
//! - `telegram`: thin teloxide command routing
//!
//! The backup pipeline is the load-bearing part: it runs unattended next to
//! the bot's event loop, survives transient store failures via
//! cooldown-and-retry, and the restore tool guarantees a downloaded
//! snapshot decompresses back to a usable database file.

pub mod core;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use self::core::{config, BackupError};
pub use self::storage::{
    create_pool, get_connection, spawn_backup_worker, BackupSettings, BackupWorker, CycleOutcome, DbConnection,
    DbPool, ObjectStoreClient, SnapshotInfo, StoreLocation,
};
