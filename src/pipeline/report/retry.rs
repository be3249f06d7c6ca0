use std::time::Duration;

use async_trait::async_trait;

use crate::pipeline::llm::{GenerationRequest, LlmClient, LlmError};

/// Fixed-wait retry for transient provider errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub rate_limit_wait: Duration,
    pub unavailable_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            rate_limit_wait: Duration::from_secs(35),
            unavailable_wait: Duration::from_secs(15),
        }
    }
}

impl RetryPolicy {
    /// How long to wait before retrying `error`, or `None` when it is not transient.
    pub fn wait_for(&self, error: &LlmError) -> Option<Duration> {
        match error {
            LlmError::RateLimited(_) => Some(self.rate_limit_wait),
            LlmError::Unavailable(_) => Some(self.unavailable_wait),
            _ => None,
        }
    }
}

/// Abstracts waiting so retry and pacing are observable in tests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested waits and returns immediately.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSleeper {
    slept: std::sync::Mutex<Vec<Duration>>,
}

#[cfg(test)]
impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.slept.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut slept) = self.slept.lock() {
            slept.push(duration);
        }
    }
}

/// Run `request`, retrying 429 and 503 responses per `policy`.
pub async fn generate_with_retry(
    llm: &dyn LlmClient,
    sleeper: &dyn Sleeper,
    policy: &RetryPolicy,
    request: &GenerationRequest,
    label: &str,
) -> Result<String, LlmError> {
    let mut attempt: u32 = 0;
    loop {
        match llm.generate(request).await {
            Ok(text) => return Ok(text),
            Err(e) => {
                let Some(wait) = policy.wait_for(&e) else {
                    return Err(e);
                };
                if attempt >= policy.max_retries {
                    tracing::warn!(
                        section = label,
                        attempts = attempt + 1,
                        error = %e,
                        "Retries exhausted"
                    );
                    return Err(e);
                }
                attempt += 1;
                tracing::warn!(
                    section = label,
                    attempt,
                    max_retries = policy.max_retries,
                    wait_secs = wait.as_secs(),
                    error = %e,
                    "Transient LLM error, retrying"
                );
                sleeper.sleep(wait).await;
            }
        }
    }
}
