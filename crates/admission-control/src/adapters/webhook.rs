//! HTTP webhook alert transport.

use crate::ports::{AlertError, AlertPayload, AlertSender};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Posts alert payloads as JSON to a webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookAlertSender {
    client: Client,
    url: String,
}

impl WebhookAlertSender {
    /// # Errors
    ///
    /// Returns `AlertError::Build` if the HTTP client cannot be constructed.
    pub fn new(url: impl Into<String>) -> Result<Self, AlertError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AlertError::Build(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AlertSender for WebhookAlertSender {
    async fn send(&self, payload: &AlertPayload) -> Result<(), AlertError> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AlertError::Timeout
                } else {
                    AlertError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Status(status.as_u16()));
        }
        Ok(())
    }
}
