//! Telegram Notifier
//!
//! Minimal Bot API client used to alert the destination channel about
//! restart outcomes. Notification failures are reported to the caller, who
//! logs and continues; alerting never gates the lifecycle sequence.

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Default Bot API endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("Telegram API rejected the message: {0}")]
    Api(String),
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
}

/// Bot API client bound to one destination chat
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    http: Client,
    api_base_url: String,
    token: String,
    chat_id: String,
    thread_id: Option<i64>,
}

impl TelegramNotifier {
    /// Create a notifier for the given credential and destination
    pub fn new(
        token: impl Into<String>,
        chat_id: impl Into<String>,
        thread_id: Option<i64>,
    ) -> Result<Self, NotifyError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Http(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
            thread_id,
        })
    }

    /// Override the API base URL (tests point this at a local server)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Send a plain-text message to the configured destination
    pub async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base_url, self.token);
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            message_thread_id: self.thread_id,
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api(body));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_thread_id_only_when_present() {
        let with_thread = SendMessageRequest {
            chat_id: "-100123",
            text: "hi",
            message_thread_id: Some(9),
        };
        let json = serde_json::to_value(&with_thread).unwrap();
        assert_eq!(json["message_thread_id"], 9);

        let without_thread = SendMessageRequest {
            chat_id: "-100123",
            text: "hi",
            message_thread_id: None,
        };
        let json = serde_json::to_value(&without_thread).unwrap();
        assert!(json.get("message_thread_id").is_none());
    }

    #[test]
    fn test_notifier_builds_with_custom_base_url() {
        let notifier = TelegramNotifier::new("123456:TOKEN", "-100123", None)
            .unwrap()
            .with_api_base_url("http://127.0.0.1:8081");
        assert_eq!(notifier.api_base_url, "http://127.0.0.1:8081");
    }
}
