//! The two points where a batch asks the user what to do.
//!
//! - after too many back-to-back failures: keep going or stop?
//! - after a pass with failures: retry now, retry more slowly, or give up?
//!
//! [`TerminalDecisions`] asks on stdin. [`PresetDecisions`] answers from
//! configuration and is what non-interactive runs use.

use std::io::{self, BufRead, Write};

use indicatif::MultiProgress;

use crate::analyzer::job::Job;
use crate::config::{FailurePolicy, RetryPolicyChoice};

/// Answer to "what about the failed jobs?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the failed jobs immediately.
    Now,
    /// Double the wait interval, then retry.
    AfterLongerWait,
    /// Leave them failed.
    Cancel,
}

/// Source of user decisions during a batch.
pub trait DecisionPrompt {
    /// `consecutive` jobs in a row have failed. Return `true` to keep going.
    fn continue_after_failures(&mut self, consecutive: usize) -> bool;

    /// The first pass finished with `failed` jobs.
    fn retry_choice(&mut self, failed: &[Job]) -> RetryDecision;
}

/// Fixed answers taken from configuration or flags.
///
/// `Ask` has no one to ask here, so it falls back to the cautious answer:
/// halt on repeated failures and do not retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresetDecisions {
    pub on_failures: FailurePolicy,
    pub on_failed_jobs: RetryPolicyChoice,
}

impl PresetDecisions {
    pub fn new(on_failures: FailurePolicy, on_failed_jobs: RetryPolicyChoice) -> Self {
        Self {
            on_failures,
            on_failed_jobs,
        }
    }
}

impl DecisionPrompt for PresetDecisions {
    fn continue_after_failures(&mut self, _consecutive: usize) -> bool {
        self.on_failures == FailurePolicy::Continue
    }

    fn retry_choice(&mut self, _failed: &[Job]) -> RetryDecision {
        match self.on_failed_jobs {
            RetryPolicyChoice::Now => RetryDecision::Now,
            RetryPolicyChoice::Slower => RetryDecision::AfterLongerWait,
            RetryPolicyChoice::Ask | RetryPolicyChoice::Never => RetryDecision::Cancel,
        }
    }
}

/// Asks on the terminal for every decision configured as `Ask`.
///
/// Falls back to [`PresetDecisions`] when stdin is not a TTY.
pub struct TerminalDecisions {
    preset: PresetDecisions,
    display: Option<MultiProgress>,
}

impl TerminalDecisions {
    pub fn new(preset: PresetDecisions) -> Self {
        Self {
            preset,
            display: None,
        }
    }

    /// Hide progress bars while a question is on screen.
    pub fn with_display(mut self, display: MultiProgress) -> Self {
        self.display = Some(display);
        self
    }

    fn ask(&self, question: &str) -> Option<String> {
        if !atty::is(atty::Stream::Stdin) {
            return None;
        }
        let read = || -> io::Result<String> {
            print!("{}", question);
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().lock().read_line(&mut input)?;
            Ok(input)
        };
        let answer = match &self.display {
            Some(display) => display.suspend(read),
            None => read(),
        };
        answer.ok()
    }
}

impl DecisionPrompt for TerminalDecisions {
    fn continue_after_failures(&mut self, consecutive: usize) -> bool {
        if self.preset.on_failures != FailurePolicy::Ask {
            return self.preset.continue_after_failures(consecutive);
        }
        let question = format!(
            "{} files failed in a row. Continue with the remaining files? [y/N] ",
            consecutive
        );
        match self.ask(&question) {
            Some(answer) => parse_yes_no(&answer).unwrap_or(false),
            None => self.preset.continue_after_failures(consecutive),
        }
    }

    fn retry_choice(&mut self, failed: &[Job]) -> RetryDecision {
        if self.preset.on_failed_jobs != RetryPolicyChoice::Ask {
            return self.preset.retry_choice(failed);
        }
        let mut question = format!(
            "{} file{} failed:\n",
            failed.len(),
            if failed.len() == 1 { "" } else { "s" }
        );
        for job in failed {
            question.push_str(&format!("  - {}\n", job));
        }
        question.push_str(
            "Retry them? [1] now  [2] after doubling the wait  [3] cancel (default): ",
        );
        match self.ask(&question) {
            Some(answer) => parse_retry_choice(&answer).unwrap_or(RetryDecision::Cancel),
            None => self.preset.retry_choice(failed),
        }
    }
}

/// Parse a y/n answer. Empty input means "no".
pub fn parse_yes_no(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "" | "n" | "no" => Some(false),
        _ => None,
    }
}

/// Parse a retry menu answer. Empty input means "cancel".
pub fn parse_retry_choice(input: &str) -> Option<RetryDecision> {
    match input.trim().to_lowercase().as_str() {
        "1" | "now" | "y" | "yes" => Some(RetryDecision::Now),
        "2" | "slower" | "wait" => Some(RetryDecision::AfterLongerWait),
        "" | "3" | "cancel" | "n" | "no" => Some(RetryDecision::Cancel),
        _ => None,
    }
}
