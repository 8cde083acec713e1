//! Lifecycle Orchestrator
//!
//! Sequences a bot restart: stop the service, prune expired snapshots,
//! sweep temp files, start the service, then verify liveness after a grace
//! period. Cleanup failures are logged into the report and the run log but
//! never block the restart; a failed start request or a failed liveness
//! check is fatal and surfaces as a non-zero exit at the CLI.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::telegram::TelegramNotifier;
use crate::domain::pruner::prune;
use crate::domain::retention::RetentionPolicy;
use crate::domain::run_log::RunLog;
use crate::domain::sweeper::sweep;
use crate::ports::service::ServicePort;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("start request for '{unit}' failed: {message}")]
    ProcessStartFailed { unit: String, message: String },

    #[error("'{unit}' is not running {grace_secs}s after start")]
    ProcessVerificationFailed { unit: String, grace_secs: u64 },
}

/// States of one restart sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleState {
    Idle,
    Stopping,
    Pruning,
    Sweeping,
    Starting,
    Verifying,
    Done,
    Failed,
}

impl LifecycleState {
    /// Returns a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Stopping => "stopping service",
            LifecycleState::Pruning => "pruning snapshots",
            LifecycleState::Sweeping => "sweeping temp files",
            LifecycleState::Starting => "starting service",
            LifecycleState::Verifying => "verifying liveness",
            LifecycleState::Done => "done",
            LifecycleState::Failed => "failed",
        }
    }

    /// True once the sequence has reached an end state
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Done | LifecycleState::Failed)
    }
}

/// One recorded step of the sequence
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub state: LifecycleState,
    pub detail: String,
}

/// Summary of one restart sequence
#[derive(Debug, Clone, Serialize)]
pub struct RestartReport {
    pub final_state: LifecycleState,
    pub pruned: usize,
    pub swept: usize,
    /// Cleanup failures, recorded but never fatal
    pub cleanup_errors: Vec<String>,
    pub steps: Vec<StepRecord>,
}

impl RestartReport {
    fn new() -> Self {
        Self {
            final_state: LifecycleState::Idle,
            pruned: 0,
            swept: 0,
            cleanup_errors: Vec::new(),
            steps: Vec::new(),
        }
    }
}

/// Drives the stop -> prune -> sweep -> start -> verify sequence
pub struct LifecycleOrchestrator<S: ServicePort> {
    service: S,
    unit: String,
    data_dir: PathBuf,
    policy: RetentionPolicy,
    sweep_patterns: Vec<String>,
    grace: Duration,
    run_log: RunLog,
    notifier: Option<TelegramNotifier>,
    notify_on_success: bool,
}

impl<S: ServicePort> LifecycleOrchestrator<S> {
    pub fn new(
        service: S,
        unit: impl Into<String>,
        data_dir: impl Into<PathBuf>,
        policy: RetentionPolicy,
        sweep_patterns: Vec<String>,
        grace: Duration,
        run_log: RunLog,
    ) -> Self {
        Self {
            service,
            unit: unit.into(),
            data_dir: data_dir.into(),
            policy,
            sweep_patterns,
            grace,
            run_log,
            notifier: None,
            notify_on_success: false,
        }
    }

    /// Attach a Telegram notifier for restart outcomes
    pub fn with_notifier(mut self, notifier: TelegramNotifier, notify_on_success: bool) -> Self {
        self.notifier = Some(notifier);
        self.notify_on_success = notify_on_success;
        self
    }

    /// Run the full restart sequence.
    ///
    /// Returns the report when the sequence ends in `Done`; fatal lifecycle
    /// errors are returned after being logged and alerted.
    pub async fn run(&self) -> Result<RestartReport, OrchestratorError> {
        let mut report = RestartReport::new();
        self.record(&mut report, LifecycleState::Idle, format!("restart of '{}' requested", self.unit));

        self.stop_phase(&mut report).await;
        self.prune_phase(&mut report);
        self.sweep_phase(&mut report);

        self.record(&mut report, LifecycleState::Starting, format!("starting '{}'", self.unit));
        if let Err(e) = self.service.start().await {
            let error = OrchestratorError::ProcessStartFailed {
                unit: self.unit.clone(),
                message: e.to_string(),
            };
            self.fail(&mut report, &error).await;
            return Err(error);
        }

        self.record(
            &mut report,
            LifecycleState::Verifying,
            format!("waiting {}s grace period", self.grace.as_secs()),
        );
        tokio::time::sleep(self.grace).await;

        let running = match self.service.is_running().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Liveness probe failed: {}", e);
                false
            }
        };

        if !running {
            let error = OrchestratorError::ProcessVerificationFailed {
                unit: self.unit.clone(),
                grace_secs: self.grace.as_secs(),
            };
            self.fail(&mut report, &error).await;
            return Err(error);
        }

        let summary = format!(
            "'{}' running; pruned {}, swept {}, {} cleanup error(s)",
            self.unit,
            report.pruned,
            report.swept,
            report.cleanup_errors.len()
        );
        report.final_state = LifecycleState::Done;
        self.record(&mut report, LifecycleState::Done, summary);

        if self.notify_on_success {
            self.alert(&format!(
                "SoLab keeper: '{}' restarted (pruned {}, swept {})",
                self.unit, report.pruned, report.swept
            ))
            .await;
        }

        Ok(report)
    }

    async fn stop_phase(&self, report: &mut RestartReport) {
        let running = match self.service.is_running().await {
            Ok(r) => r,
            Err(e) => {
                // A broken probe here is not fatal: if the service manager
                // is genuinely unusable the start phase will fail loudly.
                tracing::warn!("Liveness probe failed before stop: {}", e);
                false
            }
        };

        if !running {
            self.record(
                report,
                LifecycleState::Stopping,
                format!("'{}' already stopped, skipping", self.unit),
            );
            return;
        }

        match self.service.stop().await {
            Ok(()) => {
                self.record(report, LifecycleState::Stopping, format!("stopped '{}'", self.unit));
            }
            Err(e) => {
                tracing::warn!("Stop request failed, continuing: {}", e);
                self.record(
                    report,
                    LifecycleState::Stopping,
                    format!("stop failed ({}), continuing", e),
                );
            }
        }
    }

    fn prune_phase(&self, report: &mut RestartReport) {
        match prune(&self.data_dir, &self.policy) {
            Ok(outcome) => {
                report.pruned = outcome.deleted;
                for failure in &outcome.errors {
                    report.cleanup_errors.push(failure.to_string());
                }
                self.record(
                    report,
                    LifecycleState::Pruning,
                    format!(
                        "pruned {} snapshot(s), {} failure(s)",
                        outcome.deleted,
                        outcome.errors.len()
                    ),
                );
            }
            Err(e) => {
                report.cleanup_errors.push(e.to_string());
                self.record(report, LifecycleState::Pruning, format!("prune skipped: {}", e));
            }
        }
    }

    fn sweep_phase(&self, report: &mut RestartReport) {
        match sweep(&self.data_dir, &self.sweep_patterns) {
            Ok(outcome) => {
                report.swept = outcome.deleted;
                for failure in &outcome.errors {
                    report.cleanup_errors.push(failure.to_string());
                }
                self.record(
                    report,
                    LifecycleState::Sweeping,
                    format!(
                        "swept {} temp file(s), {} failure(s)",
                        outcome.deleted,
                        outcome.errors.len()
                    ),
                );
            }
            Err(e) => {
                report.cleanup_errors.push(e.to_string());
                self.record(report, LifecycleState::Sweeping, format!("sweep skipped: {}", e));
            }
        }
    }

    async fn fail(&self, report: &mut RestartReport, error: &OrchestratorError) {
        report.final_state = LifecycleState::Failed;
        self.record(report, LifecycleState::Failed, error.to_string());
        self.alert(&format!("SoLab keeper: restart FAILED - {}", error)).await;
    }

    /// Log one step to tracing, the run log, and the report
    fn record(&self, report: &mut RestartReport, state: LifecycleState, detail: String) {
        tracing::info!("[{}] {}", state.description(), detail);
        if let Err(e) = self.run_log.append(&detail) {
            tracing::warn!("Failed to append to run log: {}", e);
        }
        report.steps.push(StepRecord { state, detail });
    }

    async fn alert(&self, text: &str) {
        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.send(text).await {
                tracing::warn!("Failed to send Telegram alert: {}", e);
            }
        }
    }
}
