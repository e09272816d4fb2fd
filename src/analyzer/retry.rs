//! The shared retry-with-backoff routine.
//!
//! Every provider goes through [`RemoteCaller::call_remote`]:
//! 1. sleep the fixed "thinking" delay
//! 2. try `send`; on success sleep the settle delay and return
//! 3. on a transient error sleep `base + growth^attempt` seconds and try again
//! 4. on a terminal error stop at once
//!
//! The pacing delays are courtesy pauses and are configured separately from
//! the retry policy.

use std::time::Duration;

use tracing::{debug, warn};

use crate::analyzer::provider::{AnalysisProvider, ProviderError};
use crate::clock::SharedClock;
use crate::config::{PacingConfig, RetryConfig};

/// How many times to try and how long to back off in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first (at least 1)
    pub max_attempts: u32,
    /// Fixed part of every backoff
    pub base_delay: Duration,
    /// Backoff adds `growth ^ attempt` seconds
    pub growth: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            base_delay: Duration::from_secs(config.backoff_base_secs),
            growth: config.backoff_growth,
        }
    }
}

impl RetryPolicy {
    /// Backoff after the failed attempt number `attempt` (0-indexed).
    ///
    /// With the defaults: 11s, 15s, 35s.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_add(Duration::from_secs(self.growth.saturating_pow(attempt)))
    }

    /// Backoff for `error`, never shorter than what the provider asked for.
    pub fn wait_for(&self, attempt: u32, error: &ProviderError) -> Duration {
        let backoff = self.delay_for_attempt(attempt);
        match error.retry_after() {
            Some(requested) => backoff.max(requested),
            None => backoff,
        }
    }
}

/// Fixed delays around every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pacing {
    /// Before the first attempt
    pub thinking: Duration,
    /// After a successful attempt
    pub settle: Duration,
}

impl From<&PacingConfig> for Pacing {
    fn from(config: &PacingConfig) -> Self {
        Self {
            thinking: Duration::from_secs(config.thinking_secs),
            settle: Duration::from_secs(config.settle_secs),
        }
    }
}

/// Result of [`RemoteCaller::call_remote`].
#[derive(Debug)]
pub enum CallOutcome {
    Success { text: String, attempts: u32 },
    /// Every attempt failed transiently.
    Exhausted {
        attempts: u32,
        last_error: ProviderError,
    },
    /// A terminal error ended the call early.
    Rejected { attempts: u32, error: ProviderError },
}

impl CallOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            CallOutcome::Success { attempts, .. }
            | CallOutcome::Exhausted { attempts, .. }
            | CallOutcome::Rejected { attempts, .. } => *attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success { .. })
    }
}

/// Runs provider requests under a retry policy.
pub struct RemoteCaller {
    policy: RetryPolicy,
    pacing: Pacing,
    clock: SharedClock,
}

impl RemoteCaller {
    pub fn new(policy: RetryPolicy, pacing: Pacing, clock: SharedClock) -> Self {
        Self {
            policy,
            pacing,
            clock,
        }
    }

    /// Send `text` with `prompt`, retrying transient failures.
    pub fn call_remote(
        &self,
        provider: &dyn AnalysisProvider,
        text: &str,
        prompt: &str,
    ) -> CallOutcome {
        self.pause(self.pacing.thinking);

        let mut attempts = 0;
        loop {
            attempts += 1;
            debug!(provider = %provider.kind(), attempt = attempts, "Sending request");

            match provider.send(text, prompt) {
                Ok(text) => {
                    self.pause(self.pacing.settle);
                    return CallOutcome::Success { text, attempts };
                }
                Err(error) if !provider.is_transient(&error) => {
                    warn!(provider = %provider.kind(), error = %error, "Request rejected, not retrying");
                    return CallOutcome::Rejected { attempts, error };
                }
                Err(error) => {
                    if attempts >= self.policy.max_attempts {
                        warn!(provider = %provider.kind(), attempts, error = %error, "Giving up");
                        return CallOutcome::Exhausted {
                            attempts,
                            last_error: error,
                        };
                    }
                    let delay = self.policy.wait_for(attempts - 1, &error);
                    warn!(
                        provider = %provider.kind(),
                        attempt = attempts,
                        max_attempts = self.policy.max_attempts,
                        delay_secs = delay.as_secs(),
                        error = %error,
                        "Transient failure, backing off"
                    );
                    self.pause(delay);
                }
            }
        }
    }

    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            self.clock.sleep(duration);
        }
    }
}
