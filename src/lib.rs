//! promptbatch library
//!
//! Sends text files to an LLM provider one at a time, paced by a rate
//! limiter, and writes each analysis as markdown.

pub mod analyzer;
pub mod cli;
pub mod clock;
pub mod config;
pub mod interrupt;
pub mod rate_limiter;

pub use analyzer::{BatchOrchestrator, BatchReport, Job, ProviderKind};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::Config;
pub use interrupt::InterruptFlag;
pub use rate_limiter::{Interrupted, RateLimiter};
