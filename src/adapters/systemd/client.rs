//! systemd Client
//!
//! Implements the service port by shelling out to systemctl and journalctl.
//! The keeper never supervises the bot process directly; systemd owns the
//! process, this adapter only issues requests and reads state back.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use crate::ports::service::{ServiceError, ServicePort};

/// Service manager adapter for one systemd unit
#[derive(Debug, Clone)]
pub struct SystemdService {
    unit: String,
}

impl SystemdService {
    pub fn new(unit: impl Into<String>) -> Self {
        Self { unit: unit.into() }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    async fn systemctl(&self, args: &[&str]) -> Result<std::process::Output, ServiceError> {
        tracing::debug!("systemctl {}", args.join(" "));
        Command::new("systemctl")
            .args(args)
            .output()
            .await
            .map_err(|e| ServiceError::Spawn(format!("systemctl: {}", e)))
    }
}

fn stderr_text(output: &std::process::Output) -> String {
    let text = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if text.is_empty() {
        format!("exit status {}", output.status)
    } else {
        text
    }
}

#[async_trait]
impl ServicePort for SystemdService {
    async fn start(&self) -> Result<(), ServiceError> {
        let output = self.systemctl(&["start", &self.unit]).await?;
        if !output.status.success() {
            return Err(ServiceError::StartFailed(stderr_text(&output)));
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        let output = self.systemctl(&["stop", &self.unit]).await?;
        if !output.status.success() {
            return Err(ServiceError::StopFailed(stderr_text(&output)));
        }
        Ok(())
    }

    async fn is_running(&self) -> Result<bool, ServiceError> {
        // is-active exits 0 for active units and non-zero otherwise, so the
        // exit status is the answer rather than an error.
        let output = self.systemctl(&["is-active", "--quiet", &self.unit]).await?;
        Ok(output.status.success())
    }

    async fn status(&self) -> Result<String, ServiceError> {
        // systemctl status exits 3 for inactive units; its text is still
        // the status we want.
        let output = self
            .systemctl(&["status", "--no-pager", "--full", &self.unit])
            .await?;
        let text = String::from_utf8_lossy(&output.stdout).to_string();
        if text.trim().is_empty() {
            return Err(ServiceError::StatusFailed(stderr_text(&output)));
        }
        Ok(text)
    }

    async fn tail_logs(&self, lines: u32, follow: bool) -> Result<(), ServiceError> {
        let lines_arg = lines.to_string();
        let mut args = vec!["-u", self.unit.as_str(), "-n", lines_arg.as_str(), "--no-pager"];
        if follow {
            args.push("-f");
        }

        let status = Command::new("journalctl")
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| ServiceError::Spawn(format!("journalctl: {}", e)))?;

        // journalctl -f ends with SIGINT when the operator hits Ctrl+C;
        // that is a normal exit for a log tail.
        if !status.success() && !follow {
            return Err(ServiceError::LogsFailed(format!("exit status {}", status)));
        }
        Ok(())
    }
}
