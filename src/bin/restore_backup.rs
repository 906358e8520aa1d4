//! On-demand restore tool for database backups
//!
//! Companion to the bot's backup worker. Talks to the same bucket, so the
//! two B2 credential variables must be exported before any flag works:
//!
//! ```text
//! restore-backup --list
//! restore-backup --restore backup_20240101_120000.db.gz --output restored.db
//! restore-backup --latest
//! ```

use clap::{CommandFactory, Parser};
use dotenvy::dotenv;
use std::path::PathBuf;
use std::process::ExitCode;

use podpiska::core::error::BackupError;
use podpiska::storage::object_store::{ObjectStoreClient, StoreLocation};
use podpiska::storage::restore::{self, RestoreReport, VERIFY_TABLE_PREVIEW};

#[derive(Parser)]
#[command(name = "restore-backup")]
#[command(author, version, about = "Restore the bot database from an S3 backup", long_about = None)]
struct Cli {
    /// List available backups, newest first
    #[arg(long)]
    list: bool,

    /// Name of the backup to restore
    #[arg(long, value_name = "NAME", conflicts_with = "latest")]
    restore: Option<String>,

    /// Restore the most recent backup
    #[arg(long)]
    latest: bool,

    /// Output file for the restored database
    #[arg(long, value_name = "PATH", default_value = "bot_database_restored.db")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenv();
    let cli = Cli::parse();

    // Warnings from the pipeline (e.g. failed verification) go to the console
    let _ = podpiska::core::init_console_logger();

    // Fail fast on missing credentials, before any network call
    let Some(location) = StoreLocation::from_env() else {
        eprintln!("❌ Store credentials are not set. Export them first:");
        eprintln!("   export B2_KEY_ID=your_key_id");
        eprintln!("   export B2_APPLICATION_KEY=your_application_key");
        return ExitCode::FAILURE;
    };

    if !cli.list && !cli.latest && cli.restore.is_none() {
        // No action requested: print usage and exit non-zero
        let _ = Cli::command().print_help();
        return ExitCode::from(2);
    }

    match run(&cli, &location).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, location: &StoreLocation) -> Result<(), BackupError> {
    let client = ObjectStoreClient::new(location)?;
    let temp_dir = std::env::temp_dir();

    if cli.list {
        list_backups(&client).await?;
        return Ok(());
    }

    let report = if cli.latest {
        restore::restore_latest(&client, &cli.output, &temp_dir).await?
    } else if let Some(ref name) = cli.restore {
        println!("🔄 Restoring backup: {}", name);
        restore::restore(&client, name, &cli.output, &temp_dir).await?
    } else {
        unreachable!("argument presence checked in main");
    };

    print_report(&report);
    Ok(())
}

async fn list_backups(client: &ObjectStoreClient) -> Result<(), BackupError> {
    let backups = restore::list_backups(client).await?;

    if backups.is_empty() {
        println!("📭 No backups found");
        return Ok(());
    }

    println!("📋 Available backups:");
    for (i, backup) in backups.iter().enumerate() {
        println!(
            "{:3}. {} ({:.1} KB) - {}",
            i + 1,
            backup.name,
            backup.size as f64 / 1024.0,
            backup.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    Ok(())
}

fn print_report(report: &RestoreReport) {
    println!("✅ Backup restored to: {}", report.output.display());
    println!("📏 Size: {:.1} KB", report.size_bytes as f64 / 1024.0);

    match &report.tables {
        Some(tables) => {
            println!("📊 Tables in database: {}", tables.len());
            if !tables.is_empty() {
                let preview: Vec<&str> = tables.iter().take(VERIFY_TABLE_PREVIEW).map(String::as_str).collect();
                println!("   Tables: {}", preview.join(", "));
                if tables.len() > VERIFY_TABLE_PREVIEW {
                    println!("   ... and {} more", tables.len() - VERIFY_TABLE_PREVIEW);
                }
            }
        }
        None => {
            println!("⚠️  Could not verify database structure (file kept for inspection)");
        }
    }
}
