//! Retry-until-success caller
//!
//! Every call that crosses the network boundary goes through [`RetryingCaller`]:
//! on failure the error is logged, the caller waits a fixed delay and tries again.
//! There is no ceiling and no backoff unless `max_attempts` is configured. The
//! only other way out is a cancellation token attached by the operator surface.

use crate::error::BookError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Fixed delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Seconds to wait after each failed attempt
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,

    /// Optional attempt ceiling. Absent means retry forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

fn default_delay_secs() -> u64 {
    DEFAULT_RETRY_DELAY.as_secs()
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay_secs: default_delay_secs(),
            max_attempts: None,
        }
    }
}

/// Progress of one retrying invocation. Only ever observed through logs.
#[derive(Debug, Clone)]
struct RetryState {
    attempt: u32,
    last_error: Option<String>,
    elapsed: Duration,
}

/// Wraps fallible operations with a fixed-delay retry loop.
#[derive(Debug, Clone)]
pub struct RetryingCaller {
    delay: Duration,
    max_attempts: Option<u32>,
    cancel: Option<CancellationToken>,
}

impl Default for RetryingCaller {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAY)
    }
}

impl RetryingCaller {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
            cancel: None,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            delay: Duration::from_secs(config.delay_secs),
            max_attempts: config.max_attempts,
            cancel: None,
        }
    }

    /// Stop retrying once `token` is cancelled. Checked before each attempt and during waits.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `op` until it succeeds.
    ///
    /// Returns an error only when the cancellation token fires or an explicit
    /// `max_attempts` ceiling is reached. With neither configured this never fails.
    pub async fn call<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, BookError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let started = Instant::now();
        let mut state = RetryState {
            attempt: 0,
            last_error: None,
            elapsed: Duration::ZERO,
        };

        loop {
            if self.is_cancelled() {
                return Err(BookError::Cancelled);
            }

            state.attempt += 1;
            match op().await {
                Ok(value) => {
                    if state.attempt > 1 {
                        debug!(
                            operation,
                            attempt = state.attempt,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Succeeded after retrying"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => {
                    state.elapsed = started.elapsed();
                    state.last_error = Some(err.to_string());
                    warn!(
                        operation,
                        attempt = state.attempt,
                        elapsed_ms = state.elapsed.as_millis() as u64,
                        delay_secs = self.delay.as_secs(),
                        error = %err,
                        "Error in {}: {}. Retrying in {} seconds...",
                        operation,
                        err,
                        self.delay.as_secs()
                    );

                    if let Some(max) = self.max_attempts {
                        if state.attempt >= max {
                            return Err(BookError::RetriesExhausted {
                                attempts: state.attempt,
                                last_error: state.last_error.unwrap_or_default(),
                            });
                        }
                    }

                    self.wait().await?;
                }
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|token| token.is_cancelled())
            .unwrap_or(false)
    }

    async fn wait(&self) -> Result<(), BookError> {
        match &self.cancel {
            None => {
                sleep(self.delay).await;
                Ok(())
            }
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => Err(BookError::Cancelled),
                    _ = sleep(self.delay) => Ok(()),
                }
            }
        }
    }
}
