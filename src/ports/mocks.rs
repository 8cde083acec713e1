use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::service::{ServiceError, ServicePort};

/// Mock service port that records calls and replays scripted responses
#[derive(Debug, Default)]
pub struct MockService {
    calls: Arc<Mutex<Vec<String>>>,
    running_responses: Arc<Mutex<VecDeque<bool>>>,
    start_failure: Option<String>,
    stop_failure: Option<String>,
    status_text: String,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to script successive `is_running` answers.
    /// Once exhausted, further probes answer `false`.
    pub fn with_running_sequence(self, responses: &[bool]) -> Self {
        self.running_responses
            .lock()
            .unwrap()
            .extend(responses.iter().copied());
        self
    }

    /// Builder method to make `start` fail with the given message
    pub fn with_start_failure(mut self, message: &str) -> Self {
        self.start_failure = Some(message.to_string());
        self
    }

    /// Builder method to make `stop` fail with the given message
    pub fn with_stop_failure(mut self, message: &str) -> Self {
        self.stop_failure = Some(message.to_string());
        self
    }

    /// Builder method to set the `status` text
    pub fn with_status(mut self, text: &str) -> Self {
        self.status_text = text.to_string();
        self
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl ServicePort for MockService {
    async fn start(&self) -> Result<(), ServiceError> {
        self.record("start");
        match &self.start_failure {
            Some(msg) => Err(ServiceError::StartFailed(msg.clone())),
            None => Ok(()),
        }
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        self.record("stop");
        match &self.stop_failure {
            Some(msg) => Err(ServiceError::StopFailed(msg.clone())),
            None => Ok(()),
        }
    }

    async fn is_running(&self) -> Result<bool, ServiceError> {
        self.record("is_running");
        Ok(self
            .running_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(false))
    }

    async fn status(&self) -> Result<String, ServiceError> {
        self.record("status");
        Ok(self.status_text.clone())
    }

    async fn tail_logs(&self, lines: u32, follow: bool) -> Result<(), ServiceError> {
        self.record(&format!("tail_logs({}, {})", lines, follow));
        Ok(())
    }
}
