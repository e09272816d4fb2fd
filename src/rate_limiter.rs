//! Minimum spacing between remote calls.
//!
//! The limiter remembers a single timestamp, `last_call_time`. [`RateLimiter::wait`]
//! blocks until `wait_minutes` have passed since that timestamp and then stamps
//! it again. The batch orchestrator also stamps it after every successful job
//! via [`RateLimiter::mark_call`], so the spacing it enforces is measured from
//! whichever of the two happened last.

use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::debug;

use crate::clock::SharedClock;
use crate::config::{RateLimitConfig, MAX_WAIT_MINUTES};
use crate::interrupt::InterruptFlag;

/// Granularity of the blocking wait. The interrupt flag is checked between steps.
const WAIT_STEP: Duration = Duration::from_millis(100);

/// A wait was cut short by Ctrl+C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("wait interrupted by user")]
pub struct Interrupted;

/// Enforces `wait_minutes` between consecutive remote calls.
pub struct RateLimiter {
    config: RateLimitConfig,
    /// Seconds since the epoch; `0.0` means "never called".
    last_call_time: f64,
    clock: SharedClock,
    interrupt: InterruptFlag,
    display: Option<MultiProgress>,
}

impl RateLimiter {
    /// Create a limiter that has never been called.
    pub fn new(config: RateLimitConfig, clock: SharedClock, interrupt: InterruptFlag) -> Self {
        Self {
            config,
            last_call_time: 0.0,
            clock,
            interrupt,
            display: None,
        }
    }

    /// Draw wait bars inside `display` (when `show_progress` is on).
    pub fn with_display(mut self, display: MultiProgress) -> Self {
        self.display = Some(display);
        self
    }

    /// Block until the configured interval has elapsed since the last call.
    ///
    /// Returns immediately when enough time has already passed. The timestamp
    /// is refreshed on every return, including an interrupted one.
    pub fn wait(&mut self, message: Option<&str>) -> Result<(), Interrupted> {
        let result = self.wait_remaining(message);
        self.last_call_time = self.clock.now();
        result
    }

    fn wait_remaining(&self, message: Option<&str>) -> Result<(), Interrupted> {
        if self.interrupt.is_set() {
            return Err(Interrupted);
        }

        let interval = self.interval_secs();
        let elapsed = self.clock.now() - self.last_call_time;
        if elapsed >= interval {
            return Ok(());
        }

        let remaining = Duration::try_from_secs_f64(interval - elapsed).unwrap_or(Duration::ZERO);
        debug!(
            remaining_secs = remaining.as_secs_f64(),
            "Waiting before next call"
        );

        let bar = self.wait_bar(remaining, message);
        let mut left = remaining;
        while !left.is_zero() {
            if self.interrupt.is_set() {
                bar.abandon_with_message("interrupted");
                return Err(Interrupted);
            }
            let step = left.min(WAIT_STEP);
            self.clock.sleep(step);
            left -= step;
            bar.inc(step.as_millis() as u64);
        }
        bar.finish_and_clear();
        Ok(())
    }

    fn wait_bar(&self, remaining: Duration, message: Option<&str>) -> ProgressBar {
        let display = match (&self.display, self.config.show_progress) {
            (Some(display), true) => display,
            _ => return ProgressBar::hidden(),
        };

        let bar = display.add(ProgressBar::new(remaining.as_millis() as u64));
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:30.cyan/blue}] {percent}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        bar.set_message(
            message
                .map(str::to_string)
                .unwrap_or_else(|| format!("Waiting {:.0}s", remaining.as_secs_f64())),
        );
        bar
    }

    /// Forget the last call so the next `wait` returns at once.
    pub fn reset_timer(&mut self) {
        self.last_call_time = 0.0;
    }

    /// Stamp `last_call_time` with the current time.
    pub fn mark_call(&mut self) {
        self.last_call_time = self.clock.now();
    }

    /// Seconds since the epoch of the last stamp, `0.0` if never stamped.
    pub fn last_call_time(&self) -> f64 {
        self.last_call_time
    }

    /// Replace the active configuration.
    pub fn update_config(&mut self, config: RateLimitConfig) {
        self.config = config;
    }

    /// Change only the interval.
    pub fn update_wait_minutes(&mut self, wait_minutes: f64) {
        self.config = self.config.with_wait_minutes(wait_minutes);
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// The flag that cuts waits short.
    pub fn interrupt(&self) -> &InterruptFlag {
        &self.interrupt
    }

    /// Never longer than [`MAX_WAIT_MINUTES`].
    fn interval_secs(&self) -> f64 {
        self.config.wait_minutes.clamp(0.0, MAX_WAIT_MINUTES) * 60.0
    }
}
