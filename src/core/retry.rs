//! Bounded retry with exponential backoff for calls to hosted APIs.
//!
//! Connection failures, timeouts, HTTP 429 and 5xx responses are retried up to
//! `max_attempts` total attempts. Any other non-success status fails on the
//! first attempt.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(8_000),
        }
    }
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl RetryPolicy {
    /// A policy that sends each request exactly once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1u32 << shift);
        delay.min(self.max_delay)
    }

    pub fn should_retry_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    pub fn is_retryable_error(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect() || err.is_request()
    }

    /// Sends the request built by `build` until it succeeds or the policy is
    /// exhausted. `build` is called once per attempt.
    pub async fn send<F>(&self, label: &str, build: F) -> Result<Response, SendError>
    where
        F: Fn() -> RequestBuilder,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            match build().send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp
                        .text()
                        .await
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if Self::should_retry_status(status) && attempt < max_attempts {
                        let delay = self.backoff(attempt);
                        tracing::warn!(
                            "{} returned {} (attempt {}/{}), retrying in {:?}",
                            label,
                            status,
                            attempt,
                            max_attempts,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(SendError::Status { status, body });
                }
                Err(err) => {
                    if Self::is_retryable_error(&err) && attempt < max_attempts {
                        let delay = self.backoff(attempt);
                        tracing::warn!(
                            "{} failed: {} (attempt {}/{}), retrying in {:?}",
                            label,
                            err,
                            attempt,
                            max_attempts,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(SendError::Transport(err));
                }
            }
        }
    }
}
