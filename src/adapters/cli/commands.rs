//! CLI Command Definitions
//!
//! clap surface for the SoLab keeper. Every subcommand maps 1:1 onto unit
//! management, a service-port call, or the restart orchestrator.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SoLab Keeper - lifecycle and retention keeper for the SoLab analysis bot
#[derive(Parser, Debug)]
#[command(
    name = "solab-keeper",
    version = env!("CARGO_PKG_VERSION"),
    about = "Lifecycle keeper for the SoLab Telegram analysis bot",
    long_about = "Installs and controls the bot's systemd unit and keeps its storage \
                  directory bounded by pruning old analysis snapshots and sweeping \
                  temp files before every (re)start."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install the bot's systemd unit
    Install(InstallCmd),

    /// Stop the bot and remove its systemd unit
    Uninstall(UninstallCmd),

    /// Clean the storage directory, then start the bot and verify it
    Start(StartCmd),

    /// Stop the bot
    Stop(StopCmd),

    /// Full cycle: stop, prune, sweep, start, verify
    Restart(RestartCmd),

    /// Show the bot's service status
    Status(StatusCmd),

    /// Tail the bot's journal
    Logs(LogsCmd),

    /// Enable boot-time start
    Enable(EnableCmd),

    /// Disable boot-time start
    Disable(DisableCmd),

    /// Prune snapshots and sweep temp files without touching the service
    Clean(CleanCmd),
}

/// Install the systemd unit
#[derive(Parser, Debug)]
pub struct InstallCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/keeper.toml")]
    pub config: PathBuf,
}

/// Remove the systemd unit
#[derive(Parser, Debug)]
pub struct UninstallCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/keeper.toml")]
    pub config: PathBuf,
}

/// Start the bot (runs the cleanup hook first)
#[derive(Parser, Debug)]
pub struct StartCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/keeper.toml")]
    pub config: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, value_name = "FORMAT", default_value = "text")]
    pub format: String,
}

/// Stop the bot
#[derive(Parser, Debug)]
pub struct StopCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/keeper.toml")]
    pub config: PathBuf,
}

/// Restart the bot through the full lifecycle sequence
#[derive(Parser, Debug)]
pub struct RestartCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/keeper.toml")]
    pub config: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, value_name = "FORMAT", default_value = "text")]
    pub format: String,
}

/// Show service status
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/keeper.toml")]
    pub config: PathBuf,
}

/// Tail the bot's journal
#[derive(Parser, Debug)]
pub struct LogsCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/keeper.toml")]
    pub config: PathBuf,

    /// Number of journal lines to show
    #[arg(short = 'n', long, value_name = "LINES", default_value = "50")]
    pub lines: u32,

    /// Keep following new log lines
    #[arg(short, long)]
    pub follow: bool,
}

/// Enable boot-time start
#[derive(Parser, Debug)]
pub struct EnableCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/keeper.toml")]
    pub config: PathBuf,
}

/// Disable boot-time start
#[derive(Parser, Debug)]
pub struct DisableCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/keeper.toml")]
    pub config: PathBuf,
}

/// Run the cleanup pass on its own (periodic timer entry point)
#[derive(Parser, Debug)]
pub struct CleanCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/keeper.toml")]
    pub config: PathBuf,

    /// Show what would be deleted without deleting
    #[arg(long)]
    pub dry_run: bool,

    /// Output format (text, json)
    #[arg(short, long, value_name = "FORMAT", default_value = "text")]
    pub format: String,
}
