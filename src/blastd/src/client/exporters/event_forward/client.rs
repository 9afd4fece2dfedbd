use super::error::{EventForwardError, EventForwardResult};
use super::payload::{SyncRequest, SyncResponse};
use crate::constants::ACTIVITIES_PATH;
use reqwest::Client;
use std::time::Instant;
use tracing::debug;

/// Configuration for activity forwarding
#[derive(Clone, Debug)]
pub struct EventForwardConfig {
    pub endpoint: String,
    pub api_token: String,
    pub client: Client,
}

/// HTTP client posting activity batches to `<server_url>/api/activities`.
#[derive(Clone, Debug)]
pub struct ActivityForward {
    config: EventForwardConfig,
}

impl ActivityForward {
    pub fn new(server_url: &str, api_token: &str) -> Self {
        Self {
            config: EventForwardConfig {
                endpoint: format!("{}{}", server_url.trim_end_matches('/'), ACTIVITIES_PATH),
                api_token: api_token.to_string(),
                client: Client::new(),
            },
        }
    }

    /// Forwarding is disabled without a bearer credential.
    pub fn has_credential(&self) -> bool {
        !self.config.api_token.is_empty()
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Sends one batch as a single request and classifies the result.
    ///
    /// Only a 2XX response whose body parses and reports `success: true` is
    /// returned as `Ok`.
    pub async fn send_batch(&self, request: &SyncRequest) -> EventForwardResult<SyncResponse> {
        let start_time = Instant::now();

        let response = self
            .config
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EventForwardError::server_error(status.as_u16(), body));
        }

        let body = response.bytes().await?;
        let parsed: SyncResponse =
            serde_json::from_slice(&body).map_err(EventForwardError::MalformedResponse)?;

        if !parsed.success {
            return Err(EventForwardError::Rejected);
        }

        debug!(
            "Forwarded {} activities to {} in {:?}",
            request.activities.len(),
            self.config.endpoint,
            start_time.elapsed()
        );
        Ok(parsed)
    }
}
