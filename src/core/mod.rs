//! Core utilities, configuration, and common functionality

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use error::BackupError;
pub use logging::{init_console_logger, init_logger};
