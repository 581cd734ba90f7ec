//! Retry policy for backend calls.
//!
//! The default policy makes exactly one attempt. When `max_retries` is
//! raised, transient provider errors are retried with exponential backoff.

use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::providers::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Extra attempts after the first; 0 disables retry
    pub max_retries: u32,

    #[serde(with = "crate::config::humantime_duration")]
    pub min_delay: Duration,

    #[serde(with = "crate::config::humantime_duration")]
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_delays(mut self, min_delay: Duration, max_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self.max_delay = max_delay;
        self
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries as usize)
    }

    /// Run `operation`, retrying transient failures.
    ///
    /// `label` identifies the call in retry logs.
    pub async fn run<T, F, Fut>(&self, label: &str, operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        operation
            .retry(self.backoff())
            .when(ProviderError::is_transient)
            .notify(|err: &ProviderError, delay: Duration| {
                tracing::warn!(
                    call = label,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "Transient provider failure, retrying"
                );
            })
            .await
    }
}
