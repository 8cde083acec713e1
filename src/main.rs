//! SoLab Keeper - lifecycle and retention keeper for the SoLab analysis bot
//!
//! Controls the bot's systemd unit and keeps its storage directory bounded
//! by pruning old analysis snapshots before every (re)start.

mod adapters;
mod application;
mod config;
mod domain;
mod ports;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use crate::adapters::cli::{
    CleanCmd, CliApp, Command, InstallCmd, LogsCmd, RestartCmd, StartCmd, StatusCmd, StopCmd,
    UninstallCmd,
};
use crate::adapters::systemd::{self, SystemdService};
use crate::adapters::telegram::TelegramNotifier;
use crate::application::{LifecycleOrchestrator, RestartReport};
use crate::config::{load_config, KeeperConfig};
use crate::domain::pruner::{list_matching, prune};
use crate::domain::retention::split_retained;
use crate::domain::run_log::RunLog;
use crate::domain::sweeper::sweep;
use crate::ports::service::ServicePort;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (the bot token goes here, not in keeper.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    init_logging(app.verbose, app.debug);

    match app.command {
        Command::Install(cmd) => install_command(cmd).await,
        Command::Uninstall(cmd) => uninstall_command(cmd).await,
        Command::Start(cmd) => start_command(cmd).await,
        Command::Stop(cmd) => stop_command(cmd).await,
        Command::Restart(cmd) => restart_command(cmd).await,
        Command::Status(cmd) => status_command(cmd).await,
        Command::Logs(cmd) => logs_command(cmd).await,
        Command::Enable(cmd) => set_enabled_command(cmd.config, true).await,
        Command::Disable(cmd) => set_enabled_command(cmd.config, false).await,
        Command::Clean(cmd) => clean_command(cmd).await,
    }
}

fn init_logging(verbose: bool, debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt().with_env_filter(filter).with_target(false).init();
}

/// Build the restart orchestrator from configuration
fn build_orchestrator(config: &KeeperConfig) -> Result<LifecycleOrchestrator<SystemdService>> {
    let service = SystemdService::new(config.service.unit.clone());

    let mut orchestrator = LifecycleOrchestrator::new(
        service,
        config.service.unit.clone(),
        config.storage.resolved_data_dir(),
        config.storage.retention_policy(),
        config.sweep.patterns.clone(),
        Duration::from_secs(config.service.grace_period_secs),
        RunLog::new(config.logging.resolved_run_log()),
    );

    if config.alerts.enabled {
        let token = config
            .telegram
            .get_bot_token()
            .context("Telegram token vanished after validation")?;
        let notifier = TelegramNotifier::new(
            token,
            config.telegram.chat_id.clone(),
            config.telegram.thread_id,
        )
        .context("Failed to create Telegram notifier")?;
        orchestrator = orchestrator.with_notifier(notifier, config.alerts.notify_on_success);
    }

    Ok(orchestrator)
}

fn print_report(report: &RestartReport, format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "Restart complete: pruned {} snapshot(s), swept {} temp file(s)",
        report.pruned, report.swept
    );
    if !report.cleanup_errors.is_empty() {
        println!("Cleanup errors ({}):", report.cleanup_errors.len());
        for error in &report.cleanup_errors {
            println!("  - {}", error);
        }
    }
    Ok(())
}

async fn install_command(cmd: InstallCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;

    let path = systemd::install(&config.service, &config.telegram)
        .await
        .context("Failed to install systemd unit")?;

    println!("Installed {}", path.display());
    println!("Enable boot-time start with: solab-keeper enable");
    Ok(())
}

async fn uninstall_command(cmd: UninstallCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;

    systemd::uninstall(&config.service.unit)
        .await
        .context("Failed to uninstall systemd unit")?;

    println!("Uninstalled unit '{}'", config.service.unit);
    Ok(())
}

async fn start_command(cmd: StartCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;

    // Start runs the same sequence as restart; the stop phase is skipped
    // when the bot is not running, which gives start its pre-start cleanup.
    let orchestrator = build_orchestrator(&config)?;
    let report = orchestrator.run().await?;
    print_report(&report, &cmd.format)
}

async fn stop_command(cmd: StopCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let service = SystemdService::new(config.service.unit.clone());

    service.stop().await.context("Failed to stop service")?;

    println!("Stopped '{}'", config.service.unit);
    Ok(())
}

async fn restart_command(cmd: RestartCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;

    let orchestrator = build_orchestrator(&config)?;
    let report = orchestrator.run().await?;
    print_report(&report, &cmd.format)
}

async fn status_command(cmd: StatusCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let service = SystemdService::new(config.service.unit.clone());

    let text = service.status().await.context("Failed to query status")?;
    print!("{}", text);
    Ok(())
}

async fn logs_command(cmd: LogsCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let service = SystemdService::new(config.service.unit.clone());

    service
        .tail_logs(cmd.lines, cmd.follow)
        .await
        .context("Failed to tail logs")?;
    Ok(())
}

async fn set_enabled_command(config_path: std::path::PathBuf, enabled: bool) -> Result<()> {
    let config = load_config(&config_path).context("Failed to load configuration")?;

    systemd::set_enabled(&config.service.unit, enabled)
        .await
        .context("Failed to change unit enablement")?;

    println!(
        "{} '{}'",
        if enabled { "Enabled" } else { "Disabled" },
        config.service.unit
    );
    Ok(())
}

async fn clean_command(cmd: CleanCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let data_dir = config.storage.resolved_data_dir();
    let policy = config.storage.retention_policy();

    if cmd.dry_run {
        return print_clean_preview(&data_dir, &config);
    }

    let run_log = RunLog::new(config.logging.resolved_run_log());

    let prune_outcome = prune(&data_dir, &policy).context("Prune failed")?;
    let sweep_outcome = sweep(&data_dir, &config.sweep.patterns).context("Sweep failed")?;

    let line = format!(
        "clean: pruned {} snapshot(s), swept {} temp file(s), {} failure(s)",
        prune_outcome.deleted,
        sweep_outcome.deleted,
        prune_outcome.errors.len() + sweep_outcome.errors.len()
    );
    if let Err(e) = run_log.append(&line) {
        tracing::warn!("Failed to append to run log: {}", e);
    }

    if cmd.format == "json" {
        println!(
            "{}",
            serde_json::json!({
                "pruned": prune_outcome.deleted,
                "swept": sweep_outcome.deleted,
                "errors": prune_outcome
                    .errors
                    .iter()
                    .chain(sweep_outcome.errors.iter())
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>(),
            })
        );
    } else {
        println!("{}", line);
        for failure in prune_outcome.errors.iter().chain(sweep_outcome.errors.iter()) {
            println!("  failed: {}", failure);
        }
    }

    Ok(())
}

/// Dry-run listing: what clean would delete, without deleting it
fn print_clean_preview(data_dir: &Path, config: &KeeperConfig) -> Result<()> {
    let policy = config.storage.retention_policy();

    let matches = list_matching(data_dir, &policy.pattern).context("Failed to list snapshots")?;
    let (kept, expired) = split_retained(matches, policy.keep);

    println!(
        "Would prune {} of {} '{}' snapshot(s), keeping {}:",
        expired.len(),
        kept.len() + expired.len(),
        policy.pattern,
        kept.len()
    );
    for file in &expired {
        println!("  rm {}", file.path.display());
    }

    let mut temp_total = 0;
    for pattern in &config.sweep.patterns {
        let temps = list_matching(data_dir, pattern).context("Failed to list temp files")?;
        for file in &temps {
            println!("  rm {}", file.path.display());
        }
        temp_total += temps.len();
    }
    println!("Would sweep {} temp file(s)", temp_total);

    Ok(())
}
