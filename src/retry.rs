use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::errors::{Error, Result};

/// How a single attempt of a retryable operation ended.
///
/// Each operation classifies its own result; the [`retry`] loop only ever
/// looks at this value, so retry decisions stay data-driven and testable
/// without a live service.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    /// The attempt succeeded; stop retrying and yield the value.
    Success(T),
    /// The attempt failed fatally; stop retrying and report the error.
    Stop(Error),
    /// The attempt failed but may succeed later. `after` carries a
    /// server-specified wait; `None` means use the engine's own backoff.
    Retry { after: Option<Duration>, cause: Error },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            ..Self::default()
        }
    }
}

/// Runs `op` up to `config.max_attempts` times.
///
/// Between attempts the engine sleeps the current backoff delay, doubling it
/// after every retry starting from `initial_delay` (clamped to `max_delay`).
/// A `Retry { after: Some(d), .. }` outcome overrides the wait for that one
/// retry without resetting the doubling. When attempts run out, the error
/// from the final attempt is returned, never a generic timeout.
///
/// `max_attempts == 0` is a configuration error and is rejected before `op`
/// runs at all.
pub async fn retry<T, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RetryOutcome<T>>,
{
    if config.max_attempts == 0 {
        return Err(Error::invalid_config("max_attempts must be at least 1"));
    }

    let mut remaining = config.max_attempts;
    let mut delay = config.initial_delay;

    loop {
        match op().await {
            RetryOutcome::Success(value) => return Ok(value),
            RetryOutcome::Stop(err) => return Err(err),
            RetryOutcome::Retry { after, cause } => {
                remaining -= 1;
                if remaining == 0 {
                    return Err(cause);
                }

                let wait = match after {
                    Some(d) if !d.is_zero() => d,
                    _ => delay,
                };
                sleep(wait).await;

                // exponential backoff
                delay = std::cmp::min(delay * 2, config.max_delay);
            }
        }
    }
}
