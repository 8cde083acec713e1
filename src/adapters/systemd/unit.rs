//! Unit File Management
//!
//! Renders, installs and removes the systemd unit for the supervised bot,
//! and toggles boot-time enablement. Installation needs root; permission
//! failures surface as ordinary io errors.

use std::path::PathBuf;
use thiserror::Error;
use tokio::process::Command;

use crate::config::loader::{ServiceSection, TelegramSection};

/// Directory systemd loads administrator units from
pub const UNIT_DIR: &str = "/etc/systemd/system";

#[derive(Debug, Error)]
pub enum UnitError {
    #[error("failed to write unit file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to remove unit file {path}: {source}")]
    RemoveFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("systemctl {command} failed: {message}")]
    SystemctlFailed { command: String, message: String },

    #[error("failed to invoke systemctl: {0}")]
    Spawn(String),
}

/// Path of the unit file for `unit`
pub fn unit_path(unit: &str) -> PathBuf {
    PathBuf::from(UNIT_DIR).join(format!("{}.service", unit))
}

/// Render the unit file contents for the supervised bot.
///
/// The Telegram credential travels as unit environment so the bot reads it
/// the same way it does when launched by hand.
pub fn render_unit(service: &ServiceSection, telegram: &TelegramSection) -> String {
    let mut environment = String::new();
    if let Some(token) = telegram.get_bot_token() {
        environment.push_str(&format!("Environment=TELEGRAM_BOT_TOKEN={}\n", token));
    }
    environment.push_str(&format!("Environment=SOLAB_CHAT_ID={}\n", telegram.chat_id));
    if let Some(thread_id) = telegram.thread_id {
        environment.push_str(&format!("Environment=SOLAB_THREAD_ID={}\n", thread_id));
    }

    format!(
        "[Unit]\n\
         Description=SoLab Telegram analysis bot\n\
         After=network-online.target\n\
         Wants=network-online.target\n\
         \n\
         [Service]\n\
         Type=simple\n\
         ExecStart={exec_start}\n\
         WorkingDirectory={working_dir}\n\
         User={user}\n\
         {environment}\
         Restart=on-failure\n\
         RestartSec=10\n\
         StandardOutput=journal\n\
         StandardError=journal\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n",
        exec_start = service.exec_start,
        working_dir = service.working_dir,
        user = service.user,
        environment = environment,
    )
}

async fn systemctl(args: &[&str]) -> Result<(), UnitError> {
    let output = Command::new("systemctl")
        .args(args)
        .output()
        .await
        .map_err(|e| UnitError::Spawn(e.to_string()))?;

    if !output.status.success() {
        let message = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(UnitError::SystemctlFailed {
            command: args.join(" "),
            message: if message.is_empty() {
                format!("exit status {}", output.status)
            } else {
                message
            },
        });
    }
    Ok(())
}

/// Write the unit file and reload systemd
pub async fn install(service: &ServiceSection, telegram: &TelegramSection) -> Result<PathBuf, UnitError> {
    let path = unit_path(&service.unit);
    let contents = render_unit(service, telegram);

    std::fs::write(&path, contents).map_err(|source| UnitError::WriteFailed {
        path: path.clone(),
        source,
    })?;

    systemctl(&["daemon-reload"]).await?;
    tracing::info!("Installed unit {}", path.display());
    Ok(path)
}

/// Stop and disable the unit, remove its file, reload systemd.
///
/// A stop/disable failure on an already-absent unit is logged and skipped
/// so uninstall stays idempotent.
pub async fn uninstall(unit: &str) -> Result<(), UnitError> {
    if let Err(e) = systemctl(&["stop", unit]).await {
        tracing::warn!("Ignoring stop failure during uninstall: {}", e);
    }
    if let Err(e) = systemctl(&["disable", unit]).await {
        tracing::warn!("Ignoring disable failure during uninstall: {}", e);
    }

    let path = unit_path(unit);
    match std::fs::remove_file(&path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Unit file {} was already gone", path.display());
        }
        Err(source) => return Err(UnitError::RemoveFailed { path, source }),
    }

    systemctl(&["daemon-reload"]).await?;
    tracing::info!("Uninstalled unit {}", unit);
    Ok(())
}

/// Enable or disable boot-time start for the unit
pub async fn set_enabled(unit: &str, enabled: bool) -> Result<(), UnitError> {
    let command = if enabled { "enable" } else { "disable" };
    systemctl(&[command, unit]).await?;
    tracing::info!("{}d unit {}", command, unit);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_section() -> ServiceSection {
        ServiceSection {
            unit: "solab-bot".to_string(),
            exec_start: "/opt/solab/venv/bin/python /opt/solab/main.py".to_string(),
            working_dir: "/opt/solab".to_string(),
            user: "solab".to_string(),
            grace_period_secs: 5,
        }
    }

    fn telegram_section() -> TelegramSection {
        TelegramSection {
            bot_token: "123456:TEST-TOKEN".to_string(),
            chat_id: "-1001234567890".to_string(),
            thread_id: Some(7),
        }
    }

    #[test]
    fn test_unit_path() {
        assert_eq!(
            unit_path("solab-bot"),
            PathBuf::from("/etc/systemd/system/solab-bot.service")
        );
    }

    #[test]
    fn test_render_unit_contains_service_fields() {
        let rendered = render_unit(&service_section(), &telegram_section());

        assert!(rendered.contains("ExecStart=/opt/solab/venv/bin/python /opt/solab/main.py"));
        assert!(rendered.contains("WorkingDirectory=/opt/solab"));
        assert!(rendered.contains("User=solab"));
        assert!(rendered.contains("Restart=on-failure"));
        assert!(rendered.contains("WantedBy=multi-user.target"));
    }

    #[test]
    fn test_render_unit_carries_credentials_as_environment() {
        let rendered = render_unit(&service_section(), &telegram_section());

        assert!(rendered.contains("Environment=TELEGRAM_BOT_TOKEN=123456:TEST-TOKEN"));
        assert!(rendered.contains("Environment=SOLAB_CHAT_ID=-1001234567890"));
        assert!(rendered.contains("Environment=SOLAB_THREAD_ID=7"));
    }

    #[test]
    fn test_render_unit_omits_absent_thread_id() {
        let mut telegram = telegram_section();
        telegram.thread_id = None;

        let rendered = render_unit(&service_section(), &telegram);
        assert!(!rendered.contains("SOLAB_THREAD_ID"));
    }
}
