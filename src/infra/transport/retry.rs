//! Opt-in retry decorator for any [`Transport`].
//!
//! The core transport never retries. Callers that want retries wrap it:
//!
//! ```no_run
//! use std::sync::Arc;
//! use wallet_gateway_client::app::ClientConfig;
//! use wallet_gateway_client::infra::{HttpTransport, RetryPolicy, RetryingTransport};
//!
//! let http = HttpTransport::new(Arc::new(ClientConfig::default())).unwrap();
//! let transport = RetryingTransport::new(Arc::new(http), RetryPolicy::default());
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{ApiRequest, RequestResult, Transport};

use super::redact::redact_url;

/// Statuses retried by default.
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Exponential backoff settings.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub retryable_statuses: HashSet<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.into_iter().collect(),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based), capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(i32::MAX as u32) as i32);
        let delay = self.initial_delay.as_secs_f64() * factor;
        if !delay.is_finite() || delay >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(delay)
        }
    }

    /// Whether a failed result is worth repeating.
    ///
    /// A failure with a status is retried only if the status is in the set;
    /// a status-less failure is retried when its kind is transient.
    pub fn should_retry<T>(&self, result: &RequestResult<T>) -> bool {
        match result {
            RequestResult::Success { .. } => false,
            RequestResult::Failure { error } => match error.http_status() {
                Some(status) => self.retryable_statuses.contains(&status),
                None => error.is_retryable(),
            },
        }
    }
}

/// Transport wrapper that repeats failed requests per a [`RetryPolicy`].
pub struct RetryingTransport {
    inner: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RetryingTransport {
    #[must_use]
    pub fn new(inner: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl Transport for RetryingTransport {
    async fn execute(&self, request: ApiRequest) -> RequestResult<Value> {
        let display_path = redact_url(&request.path);
        let mut attempt = 0;
        loop {
            let result = self.inner.execute(request.clone()).await;

            if attempt >= self.policy.max_retries || !self.policy.should_retry(&result) {
                if attempt > 0 {
                    debug!(
                        attempts = attempt + 1,
                        success = result.is_success(),
                        path = %display_path,
                        "Retry loop finished"
                    );
                }
                return result;
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                attempt = attempt + 1,
                max_retries = self.policy.max_retries,
                status = ?result.http_status(),
                error = ?result.error_message(),
                delay_ms = delay.as_millis() as u64,
                path = %display_path,
                "Request failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
