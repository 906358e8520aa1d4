use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;

use podpiska::core::{config, init_logger};
use podpiska::storage::backup::{BackupSettings, BackupWorker, CycleOutcome};
use podpiska::storage::{create_pool, spawn_backup_worker, StoreLocation};
use podpiska::telegram;

mod cli;
use cli::{Cli, Commands};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    let _ = dotenv();

    let cli = Cli::parse_args();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::BackupNow) => backup_now().await,
        Some(Commands::Run) | None => run_bot().await,
    }
}

/// One-shot backup, bypassing the scheduler. Exits non-zero on failure.
async fn backup_now() -> Result<()> {
    let worker = BackupWorker::from_env(CancellationToken::new());
    match worker.backup_once().await? {
        CycleOutcome::Uploaded(name) => {
            log::info!("✅ Backup uploaded: {}", name);
            Ok(())
        }
        CycleOutcome::NotConfigured => Err(anyhow::anyhow!(
            "store credentials not set (B2_KEY_ID / B2_APPLICATION_KEY)"
        )),
        CycleOutcome::SourceMissing => Err(anyhow::anyhow!(
            "database file {} not found",
            config::DATABASE_PATH.as_str()
        )),
    }
}

async fn run_bot() -> Result<()> {
    log::info!("🤖 Starting podpiska bot");

    // Create database connection pool (runs schema init)
    let db_pool = Arc::new(
        create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?,
    );

    // Start the backup worker; it shares nothing with the bot loop except
    // the database file path and reads its store location from the
    // environment on every cycle
    let cancel = CancellationToken::new();
    let worker_handle = spawn_backup_worker(
        BackupSettings::from_env(),
        Arc::new(StoreLocation::from_env),
        cancel.clone(),
    );

    if StoreLocation::from_env().is_some() {
        log::info!("✅ Backup service enabled");
    } else {
        log::warn!("⚠️  Backups disabled (B2_KEY_ID / B2_APPLICATION_KEY not set)");
    }

    let bot = Bot::from_env();

    if let Err(e) = telegram::setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    match bot.get_me().await {
        Ok(me) => log::info!("🎉 Bot @{} started", me.username()),
        Err(e) => log::warn!("Could not fetch bot info: {}", e),
    }

    // Blocks until ctrl-c stops the dispatcher
    telegram::run_dispatcher(bot, db_pool).await;

    // Deterministic shutdown: cancel the worker and join it within a bound
    log::info!("Dispatcher stopped, shutting down backup worker");
    cancel.cancel();
    if tokio::time::timeout(config::shutdown::join_timeout(), worker_handle)
        .await
        .is_err()
    {
        log::warn!(
            "Backup worker did not stop within {}s, abandoning it",
            config::shutdown::JOIN_TIMEOUT_SECS
        );
    }

    log::info!("👋 Shutdown complete");
    Ok(())
}
