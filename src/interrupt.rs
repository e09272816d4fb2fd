//! Ctrl+C handling for batch runs.
//!
//! The handler only flips a shared flag. The rate limiter checks the flag
//! while waiting, so an interrupt ends the current pass at the next wait
//! instead of killing the process mid-write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared interrupt flag set by SIGINT.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    flag: Arc<AtomicBool>,
}

impl InterruptFlag {
    /// Create an unset flag with no signal handler attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the Ctrl+C handler that sets this flag.
    ///
    /// A second Ctrl+C before the flag is cleared exits the process.
    /// Safe to call more than once; later registrations are ignored.
    pub fn register_ctrlc(&self) {
        let flag = self.flag.clone();
        ctrlc::set_handler(move || {
            if flag.swap(true, Ordering::SeqCst) {
                std::process::exit(130);
            }
            eprintln!("\nInterrupt received, stopping after the current file (Ctrl+C again to quit)");
        })
        .ok(); // Ignore if handler already set
    }

    /// Whether an interrupt has been requested since the last `clear`.
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request an interrupt (used by tests and by the signal handler).
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Reset the flag before a new pass.
    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
