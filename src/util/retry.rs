//! Connect retry with capped exponential backoff.

use std::future::Future;
use std::time::Duration;

use crate::error::McpToolsError;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts in total, the first one included. Zero behaves like one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (zero-based), capped at `max_backoff`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(retry.min(i32::MAX as u32) as i32);
        let secs = self.initial_backoff.as_secs_f64() * factor;
        Duration::from_secs_f64(secs.min(self.max_backoff.as_secs_f64()))
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempts run out. `label` names the target in logs.
    pub async fn run<F, Fut, T>(&self, label: &str, mut operation: F) -> Result<T, McpToolsError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, McpToolsError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut retry = 0;
        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            if !error.is_retryable() || retry + 1 >= attempts {
                return Err(error);
            }
            let delay = self.delay_for(retry);
            tracing::warn!(
                server = label,
                attempt = retry + 1,
                max_attempts = attempts,
                delay_ms = delay.as_millis() as u64,
                %error,
                "retrying"
            );
            tokio::time::sleep(delay).await;
            retry += 1;
        }
    }
}
