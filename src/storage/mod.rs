//! Database glue and the backup-and-restore pipeline

pub mod backup;
pub mod db;
pub mod object_store;
pub mod restore;
pub mod snapshot;

// Re-exports for convenience
pub use backup::{spawn_backup_worker, BackupSettings, BackupWorker, CycleOutcome};
pub use db::{create_pool, get_connection, DbConnection, DbPool};
pub use object_store::{ObjectStoreClient, SnapshotInfo, StoreLocation};
