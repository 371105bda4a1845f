use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

use super::traits::ResponseDispatcher;
use super::types::{parse_reply_payload, DispatchFailure, DispatchOutcome, Prompt, PromptRequest};
use crate::constants::REACHABILITY_TIMEOUT_SECS;
use crate::utils::CoachError;

/// Dispatcher talking JSON over HTTP to the coach inference service
pub struct HttpDispatcher {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl HttpDispatcher {
    /// Create a dispatcher for `url`, bounding every request by `timeout`
    pub fn new(url: &str, timeout: Duration) -> Result<Self, CoachError> {
        let url = Url::parse(url)
            .map_err(|e| CoachError::ConfigError(format!("invalid endpoint url {url:?}: {e}")))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoachError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn transport_failure(&self, err: reqwest::Error) -> DispatchFailure {
        if err.is_timeout() {
            DispatchFailure::Timeout(self.timeout)
        } else {
            DispatchFailure::Unreachable(err.to_string())
        }
    }
}

#[async_trait]
impl ResponseDispatcher for HttpDispatcher {
    async fn send(&self, prompt: &Prompt) -> DispatchOutcome {
        debug!(url = %self.url, "dispatching prompt");

        let response = self
            .client
            .post(self.url.clone())
            .json(&PromptRequest {
                prompt: prompt.as_str(),
            })
            .send()
            .await
            .map_err(|e| self.transport_failure(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchFailure::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_failure(e))?;

        parse_reply_payload(&body)
    }

    async fn is_reachable(&self) -> bool {
        // Any HTTP answer proves the service is there, even a 404 or 405
        let response = self
            .client
            .get(self.url.clone())
            .timeout(Duration::from_secs(REACHABILITY_TIMEOUT_SECS))
            .send()
            .await;

        response.is_ok()
    }
}
