use crate::utils::error::{Result, SkillkitError};
use crate::utils::validation::{validate_positive_number, validate_range, Validate};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Exponential backoff policy for outbound HTTP calls (webhooks, generation API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub enabled: bool,
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    /// Fraction of the computed delay added or removed at random (0.0 to 1.0).
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 60000,
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (attempt 0 is the first call).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 || !self.enabled {
            return Duration::ZERO;
        }

        let base = self.initial_delay_ms as f64 * self.multiplier.powi(attempt as i32 - 1);
        let capped = base.min(self.max_delay_ms as f64);

        let jitter_range = capped * self.jitter;
        let jitter = (rand::random::<f64>() - 0.5) * 2.0 * jitter_range;
        Duration::from_millis((capped + jitter).max(0.0) as u64)
    }

    pub fn max_attempts(&self) -> u32 {
        if self.enabled {
            self.max_retries + 1
        } else {
            1
        }
    }
}

impl Validate for RetryPolicy {
    fn validate(&self) -> Result<()> {
        validate_range("retry.jitter", self.jitter, 0.0, 1.0)?;
        validate_range("retry.multiplier", self.multiplier, 1.0, 10.0)?;
        validate_positive_number("retry.max_delay_ms", self.max_delay_ms, self.initial_delay_ms)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T>,
    pub attempts: u32,
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the policy
/// runs out of attempts.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> RetryOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match op().await {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts,
                }
            }
            Err(e) => {
                if !e.is_retryable() || attempts >= policy.max_attempts() {
                    return RetryOutcome {
                        result: Err(e),
                        attempts,
                    };
                }
                let delay = policy.delay_for(attempts);
                tracing::warn!(
                    "⚠️ {} attempt {}/{} failed: {} (retrying in {:?})",
                    label,
                    attempts,
                    policy.max_attempts(),
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Turns a non-2xx response into an error carrying a truncated body.
pub async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SkillkitError::UpstreamStatusError {
        status: status.as_u16(),
        body: crate::utils::text::truncate(&body, 512),
    })
}
