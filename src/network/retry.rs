//! Retry logic and reconnection delays with exponential backoff

use std::time::Duration;
use tracing::warn;
use crate::errors::DashResult;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            exponential_base: 2.0,
        }
    }
}

/// Capped exponential delay sequence with +/-5% jitter.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: RetryConfig,
    attempt: u32,
    next_delay_ms: u64,
}

impl Backoff {
    pub fn new(config: RetryConfig) -> Self {
        let next_delay_ms = config.initial_delay_ms;
        Self {
            config,
            attempt: 0,
            next_delay_ms,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn next_delay(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        let delay = self.next_delay_ms;

        let grown = (delay as f64 * self.config.exponential_base) as u64;
        self.next_delay_ms = grown.min(self.config.max_delay_ms).max(self.config.initial_delay_ms);

        let jitter = (delay as f64 * 0.1 * (rand::random::<f64>() - 0.5)) as i64;
        Duration::from_millis(delay.saturating_add_signed(jitter))
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
        self.next_delay_ms = self.config.initial_delay_ms;
    }
}

pub async fn retry_with_backoff<F, Fut, T>(
    operation: F,
    config: &RetryConfig,
    context: &str,
) -> DashResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = DashResult<T>>,
{
    let mut backoff = Backoff::new(config.clone());

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if backoff.attempt() + 1 >= config.max_attempts => {
                return Err(e);
            }
            Err(e) => {
                let delay = backoff.next_delay();
                warn!(
                    "Attempt {}/{} failed for {}: {}. Retrying in {:?}...",
                    backoff.attempt(), config.max_attempts, context, e, delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DashError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay_ms: 1,
            max_delay_ms: 4,
            exponential_base: 2.0,
        }
    }

    #[test]
    fn backoff_grows_until_capped_and_resets() {
        let mut backoff = Backoff::new(RetryConfig {
            max_attempts: 10,
            initial_delay_ms: 1000,
            max_delay_ms: 4000,
            exponential_base: 2.0,
        });
        let delays: Vec<u64> = (0..4).map(|_| backoff.next_delay().as_millis() as u64).collect();

        assert!((950..=1050).contains(&delays[0]));
        assert!((1900..=2100).contains(&delays[1]));
        assert!((3800..=4200).contains(&delays[2]));
        assert!((3800..=4200).contains(&delays[3]));
        assert_eq!(backoff.attempt(), 4);

        backoff.reset();
        assert_eq!(backoff.attempt(), 0);
        assert!((950..=1050).contains(&(backoff.next_delay().as_millis() as u64)));
    }

    #[tokio::test]
    async fn retry_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(DashError::Config("not yet".to_string()))
                } else {
                    Ok(42)
                }
            },
            &quick_config(5),
            "flaky op",
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_returns_last_error_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: DashResult<()> = retry_with_backoff(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DashError::Config("down".to_string()))
            },
            &quick_config(3),
            "always failing op",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
