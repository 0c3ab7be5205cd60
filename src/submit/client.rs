//! Submission transport
//!
//! JSON POST to the contribution endpoint with retry and exponential
//! backoff. Retry behavior:
//! - 429 (rate limited): backoff 2s, 4s, 8s
//! - 5xx (server error): backoff 1s, 2s, 4s
//! - Timeout/connect error: backoff 1s, 2s, 4s
//! - Other 4xx: non-retriable; the response body is parsed as a structured
//!   rejection and surfaced verbatim
//!
//! Transport failures leave the caller's session untouched so the user can
//! retry submission without re-recording.

use crate::submit::payload::{SubmissionAccepted, SubmissionPayload, SubmissionRejected};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitConfig {
    /// Contribution endpoint URL
    pub endpoint: String,
    /// Attempts before giving up (each with backoff)
    pub max_retries: u32,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            max_retries: 3,
            timeout_secs: 30,
        }
    }
}

impl SubmitConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if !(1..=10).contains(&self.max_retries) {
            return Err(crate::Error::Config(format!(
                "max_retries must be in [1, 10], got {}",
                self.max_retries
            )));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::Config(
                "timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP client for the contribution endpoint.
pub struct SubmissionClient {
    client: Client,
    config: SubmitConfig,
}

impl SubmissionClient {
    /// Build a client. Fails if the endpoint is not configured.
    pub fn new(config: SubmitConfig) -> crate::Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(crate::Error::Config(
                "submission endpoint is not configured".to_string(),
            ));
        }
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// POST a payload and interpret the response contract.
    pub async fn submit(&self, payload: &SubmissionPayload) -> crate::Result<SubmissionAccepted> {
        let mut last_error: Option<crate::Error> = None;

        for attempt in 0..self.config.max_retries {
            let result = self
                .client
                .post(&self.config.endpoint)
                .json(payload)
                .send()
                .await;

            match result {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let accepted = resp.json::<SubmissionAccepted>().await?;
                        info!(
                            word = %payload.word,
                            total_contributions = accepted.total_contributions,
                            "submission accepted"
                        );
                        return Ok(accepted);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        // Longer backoff: the endpoint needs time to reset
                        // its request quota
                        let delay = Duration::from_secs(2u64.pow(attempt + 1));
                        warn!("submit: rate limited (429), retrying in {:?}", delay);
                        last_error = Some(Self::backend_error(status.as_u16(), resp).await);
                        tokio::time::sleep(delay).await;
                    } else if status.is_server_error() {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        warn!(
                            "submit: server error ({}), retrying in {:?}",
                            status, delay
                        );
                        last_error = Some(Self::backend_error(status.as_u16(), resp).await);
                        tokio::time::sleep(delay).await;
                    } else {
                        // Non-retriable rejection: surface the reason verbatim
                        return Err(Self::backend_error(status.as_u16(), resp).await);
                    }
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    warn!("submit: network error ({}), retrying in {:?}", e, delay);
                    last_error = Some(e.into());
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(
            "submit: failed after {} attempts",
            self.config.max_retries
        );
        Err(last_error.expect("at least one submit attempt was made"))
    }

    /// Parse a failure body into a structured backend error. A body that is
    /// not the rejection contract is carried as the raw reason text.
    async fn backend_error(status: u16, resp: reqwest::Response) -> crate::Error {
        let body = resp.text().await.unwrap_or_default();
        match serde_json::from_str::<SubmissionRejected>(&body) {
            Ok(rejected) => crate::Error::Backend {
                status,
                reason: rejected.reason,
                breakdown: rejected.quality_breakdown,
            },
            Err(_) => crate::Error::Backend {
                status,
                reason: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body
                },
                breakdown: None,
            },
        }
    }
}
