//! Service Port - process supervision boundary
//!
//! The keeper never supervises the bot process itself; the host's service
//! manager does. This trait is the seam the orchestrator and CLI talk to,
//! so tests can substitute a recording mock.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to invoke service manager: {0}")]
    Spawn(String),

    #[error("start request failed: {0}")]
    StartFailed(String),

    #[error("stop request failed: {0}")]
    StopFailed(String),

    #[error("status query failed: {0}")]
    StatusFailed(String),

    #[error("log query failed: {0}")]
    LogsFailed(String),
}

/// Operations the host's service manager provides for the supervised bot
#[async_trait]
pub trait ServicePort: Send + Sync {
    /// Request the service start
    async fn start(&self) -> Result<(), ServiceError>;

    /// Request the service stop
    async fn stop(&self) -> Result<(), ServiceError>;

    /// Whether the service is currently active
    async fn is_running(&self) -> Result<bool, ServiceError>;

    /// Human-readable status text
    async fn status(&self) -> Result<String, ServiceError>;

    /// Tail the service's logs to the caller's terminal
    async fn tail_logs(&self, lines: u32, follow: bool) -> Result<(), ServiceError>;
}
