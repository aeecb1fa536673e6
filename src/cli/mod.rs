pub mod audit;
pub mod config;
pub mod daemon;
pub mod init;
pub mod item;
pub mod json_output;
pub mod rotate;
pub mod schedule;

use std::io::{self, Read};
use std::time::Duration;

use clap::{Parser, Subcommand};

use passrot::api::PassrotClient;
use passrot::auth;
use passrot::error::{PassrotError, Result};

#[derive(Parser)]
#[command(
    name = "passrot",
    version,
    about = "Scheduled password rotation for protected content items"
)]
pub struct Cli {
    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new catalog and arm the rotation job
    Init {
        /// Generate a keyfile at this path instead of using a passphrase
        #[arg(long)]
        generate_keyfile: Option<String>,
        /// Set catalog passphrase non-interactively
        #[arg(long, env = "PASSROT_PASSPHRASE")]
        passphrase: Option<String>,
    },

    /// Manage protected items
    Item {
        #[command(subcommand)]
        command: ItemCommands,
    },

    /// Rotate every protected item now
    Rotate,

    /// Inspect and drive the rotation job
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommands,
    },

    /// Run the rotation job in the foreground whenever it comes due
    Daemon {
        /// Longest sleep between checks (e.g. "30s", "5m")
        #[arg(long, default_value = "60s", value_parser = humantime::parse_duration)]
        poll: Duration,
    },

    /// View and verify audit logs
    Audit {
        #[command(subcommand)]
        command: AuditCommands,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ItemCommands {
    /// Add an item (reads its password from stdin; empty means unprotected)
    Add {
        /// Item title
        title: String,
        /// Rotation interval in days
        #[arg(long)]
        interval: Option<String>,
    },
    /// List items
    List,
    /// Show one item
    Show {
        id: u64,
        /// Also print the current password
        #[arg(long)]
        reveal: bool,
    },
    /// Save an item's configuration
    Save {
        id: u64,
        /// Rotation interval in days ("" or "0" clears it)
        #[arg(long)]
        interval: Option<String>,
        /// Read a new password from stdin
        #[arg(long)]
        secret_stdin: bool,
    },
    /// Remove an item
    Remove { id: u64 },
}

#[derive(Subcommand)]
pub enum ScheduleCommands {
    /// Arm the hourly rotation job if it is not armed
    Arm,
    /// Show the rotation job
    Status,
    /// Run the rotation job once if it is due
    Tick,
}

#[derive(Subcommand)]
pub enum AuditCommands {
    /// Show recent audit log entries
    Show {
        /// Number of entries to show (0 = all)
        #[arg(long, short, default_value = "20")]
        count: usize,
    },
    /// Verify audit log integrity
    Verify,
    /// Export audit log as JSON array
    Export,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
}

/// Build a client from the resolved credentials.
pub fn client() -> Result<PassrotClient> {
    let (key, ctx) = auth::resolve_auth()?;
    Ok(PassrotClient::new(key, ctx.actor_name()))
}

/// Read a secret from stdin, trimming the trailing newline left by `echo`.
pub fn read_secret_stdin() -> Result<String> {
    let mut value = String::new();
    io::stdin()
        .read_to_string(&mut value)
        .map_err(|e| PassrotError::Other(format!("Failed to read from stdin: {}", e)))?;
    Ok(value.trim_end_matches('\n').trim_end_matches('\r').to_string())
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let s = serde_json::to_string(value).map_err(|e| PassrotError::Serialization(e.to_string()))?;
    println!("{}", s);
    Ok(())
}
