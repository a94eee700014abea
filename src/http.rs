//! Shared JSON-over-HTTP plumbing for the model clients.
//!
//! The embedding backends and the chat client all talk to their services
//! the same way: POST a JSON body and parse a JSON reply. [`Endpoint`]
//! owns that exchange along with the retry policy.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Result};
use std::time::Duration;

/// A JSON API endpoint plus its timeout and retry policy.
#[derive(Debug)]
pub(crate) struct Endpoint {
    pub url: String,
    pub bearer: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Endpoint {
    /// POST `body` to the endpoint and parse the JSON response, retrying
    /// transient failures per the policy above.
    pub async fn post_json(&self, body: &serde_json::Value) -> Result<serde_json::Value> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let mut request = client
                .post(&self.url)
                .header("Content-Type", "application/json")
                .json(body);
            if let Some(token) = &self.bearer {
                request = request.bearer_auth(token);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response.json().await?);
                    }

                    let text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err =
                            Some(anyhow::anyhow!("{} returned {}: {}", self.url, status, text));
                        continue;
                    }
                    bail!("{} returned {}: {}", self.url, status, text);
                }
                Err(e) => {
                    last_err = Some(anyhow::anyhow!(
                        "request to {} failed (is the server running?): {}",
                        self.url,
                        e
                    ));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("request to {} failed", self.url)))
    }
}
