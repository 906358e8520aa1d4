use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "podpiska")]
#[command(author, version, about = "Telegram subscription bot with automatic S3 database backups", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (default when no subcommand is given)
    Run,

    /// Create one backup immediately and exit
    BackupNow,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
