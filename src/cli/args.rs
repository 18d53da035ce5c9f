//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// routervault - scheduled SSH backup orchestrator for MikroTik-class routers
#[derive(Parser, Debug)]
#[command(name = "routervault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./routervault.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration file
    Init,

    /// Run one backup cycle
    Run {
        /// Back up only this device
        #[arg(long)]
        device: Option<String>,

        /// Record the cycle as schedule-triggered
        #[arg(long)]
        scheduled: bool,
    },

    /// Run the recurring scheduler until interrupted
    Serve,

    /// Manage registered devices
    Device {
        #[command(subcommand)]
        action: DeviceAction,
    },

    /// Browse and delete backup artifacts
    Artifact {
        #[command(subcommand)]
        action: ArtifactAction,
    },

    /// Inspect run history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Show or override the backup schedule
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum DeviceAction {
    /// Register a device
    Add {
        name: String,
        host: String,
        username: String,
        password: String,
        #[arg(long, default_value_t = crate::registry::DEFAULT_SSH_PORT)]
        port: u16,
    },

    /// Remove a registered device
    Remove { name: String },

    /// List registered devices
    List,

    /// Probe connectivity to a registered device
    Test { name: String },
}

#[derive(Subcommand, Debug)]
pub enum ArtifactAction {
    /// List stored artifacts, newest first
    List {
        /// Only this device's artifacts
        #[arg(long)]
        device: Option<String>,
    },

    /// Delete an artifact and its pair sibling
    Delete { path: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// Show recent run records
    List {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Show statistics, overall or per device
    Stats {
        #[arg(long)]
        device: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ScheduleAction {
    /// Show the effective schedule and its next occurrence
    Show,

    /// Override the schedule with a cron expression
    Set { expression: String },

    /// Remove the override and return to the configured default
    Clear,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
