//! The batch orchestrator.
//!
//! Runs every job once, then offers a single retry pass over the ones that
//! failed. Per job:
//!
//! 1. wait for the rate limiter (except for the first job of a pass)
//! 2. read the file, render the prompt, call the provider
//! 3. write the markdown result, or record the failure
//!
//! During the first pass a run of `failure_threshold` failures pauses the
//! batch and asks whether to go on. The retry pass never asks, and is not
//! offered at all once Ctrl+C has been pressed.

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::analyzer::decision::{DecisionPrompt, RetryDecision};
use crate::analyzer::error::JobError;
use crate::analyzer::job::Job;
use crate::analyzer::output::OutputLayout;
use crate::analyzer::progress::BatchProgress;
use crate::analyzer::prompt::PromptLibrary;
use crate::analyzer::provider::AnalysisProvider;
use crate::analyzer::retry::{CallOutcome, RemoteCaller};
use crate::config::MAX_WAIT_MINUTES;
use crate::rate_limiter::RateLimiter;

/// Default number of back-to-back failures before asking.
pub const DEFAULT_FAILURE_THRESHOLD: usize = 3;

/// What happened to one job in one pass.
#[derive(Debug)]
pub struct JobOutcome {
    pub job: Job,
    /// Path of the written result, or why there is none
    pub result: Result<PathBuf, JobError>,
    /// Remote attempts made (0 when the job failed before calling out)
    pub attempts: u32,
}

impl JobOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Result of one pass over a list of jobs.
#[derive(Debug, Default)]
pub struct PassReport {
    /// Outcomes in processing order
    pub outcomes: Vec<JobOutcome>,
    /// The user chose to stop after repeated failures
    pub halted: bool,
    /// Ctrl+C was pressed during the pass
    pub interrupted: bool,
    /// Jobs never started because the pass ended early
    pub skipped: usize,
}

impl PassReport {
    pub fn successes(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| o.succeeded())
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    /// Jobs that failed, in processing order.
    pub fn failed_jobs(&self) -> Vec<Job> {
        self.failures().map(|o| o.job.clone()).collect()
    }
}

/// Result of a whole batch.
#[derive(Debug)]
pub struct BatchReport {
    pub first_pass: PassReport,
    /// What the user chose for the failed jobs, if there were any
    pub retry_decision: Option<RetryDecision>,
    pub retry_pass: Option<PassReport>,
}

impl BatchReport {
    /// Successful outcomes from both passes.
    pub fn successes(&self) -> Vec<&JobOutcome> {
        self.passes().flat_map(|p| p.successes()).collect()
    }

    /// Latest outcome of every job that never succeeded.
    pub fn permanent_failures(&self) -> Vec<&JobOutcome> {
        self.first_pass
            .failures()
            .filter_map(|first| {
                let retried = self
                    .retry_pass
                    .as_ref()
                    .and_then(|p| p.outcomes.iter().find(|o| o.job == first.job));
                match retried {
                    Some(outcome) if outcome.succeeded() => None,
                    Some(outcome) => Some(outcome),
                    None => Some(first),
                }
            })
            .collect()
    }

    pub fn halted(&self) -> bool {
        self.first_pass.halted
    }

    pub fn interrupted(&self) -> bool {
        self.passes().any(|p| p.interrupted)
    }

    /// Jobs never attempted in the first pass.
    pub fn skipped(&self) -> usize {
        self.first_pass.skipped
    }

    /// Everything succeeded and nothing was cut short.
    pub fn is_complete(&self) -> bool {
        self.permanent_failures().is_empty() && !self.halted() && self.skipped() == 0
    }

    /// Human-readable end-of-batch summary.
    pub fn summary(&self) -> String {
        let failures = self.permanent_failures();
        let mut out = format!(
            "Done: {} succeeded, {} failed",
            self.successes().len(),
            failures.len()
        );
        if self.skipped() > 0 {
            out.push_str(&format!(", {} not attempted", self.skipped()));
        }
        out.push('\n');

        if self.halted() {
            out.push_str("Stopped after repeated failures.\n");
        }
        if self.interrupted() {
            out.push_str("Interrupted.\n");
        }
        if !failures.is_empty() {
            out.push_str("Failed files:\n");
            for outcome in failures {
                if let Err(e) = &outcome.result {
                    out.push_str(&format!("  {}: {}\n", outcome.job, e));
                }
            }
        }
        out
    }

    fn passes(&self) -> impl Iterator<Item = &PassReport> {
        std::iter::once(&self.first_pass).chain(self.retry_pass.iter())
    }
}

/// Drives a batch of jobs against one provider.
pub struct BatchOrchestrator {
    provider: Box<dyn AnalysisProvider>,
    caller: RemoteCaller,
    limiter: RateLimiter,
    prompts: PromptLibrary,
    output: OutputLayout,
    decisions: Box<dyn DecisionPrompt>,
    failure_threshold: usize,
    progress: BatchProgress,
}

impl BatchOrchestrator {
    pub fn new(
        provider: Box<dyn AnalysisProvider>,
        caller: RemoteCaller,
        limiter: RateLimiter,
        prompts: PromptLibrary,
        output: OutputLayout,
        decisions: Box<dyn DecisionPrompt>,
    ) -> Self {
        Self {
            provider,
            caller,
            limiter,
            prompts,
            output,
            decisions,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            progress: BatchProgress::hidden(),
        }
    }

    /// Failures in a row before asking (minimum 1).
    pub fn with_failure_threshold(mut self, threshold: usize) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    pub fn with_progress(mut self, progress: BatchProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Run the first pass and, if the user agrees, one retry pass.
    pub fn run(&mut self, jobs: &[Job]) -> BatchReport {
        self.limiter.reset_timer();
        info!(
            provider = %self.provider.kind(),
            model = self.provider.model(),
            jobs = jobs.len(),
            "Starting batch"
        );

        let first_pass = self.run_pass("Pass 1", jobs, true);
        let failed = first_pass.failed_jobs();
        if failed.is_empty() {
            return BatchReport {
                first_pass,
                retry_decision: None,
                retry_pass: None,
            };
        }

        if first_pass.interrupted {
            info!(failed = failed.len(), "Interrupted, not offering a retry");
            return BatchReport {
                first_pass,
                retry_decision: Some(RetryDecision::Cancel),
                retry_pass: None,
            };
        }

        let decision = self.decisions.retry_choice(&failed);
        let retry_pass = match decision {
            RetryDecision::Cancel => None,
            RetryDecision::Now => Some(self.run_pass("Retry", &failed, false)),
            RetryDecision::AfterLongerWait => {
                let doubled = (self.limiter.config().wait_minutes * 2.0).min(MAX_WAIT_MINUTES);
                info!(wait_minutes = doubled, "Doubling wait before retry");
                self.limiter.update_wait_minutes(doubled);
                Some(self.run_pass("Retry", &failed, false))
            }
        };

        BatchReport {
            first_pass,
            retry_decision: Some(decision),
            retry_pass,
        }
    }

    /// Process `jobs` in order. The breaker only runs when `breaker` is set.
    pub fn run_pass(&mut self, label: &str, jobs: &[Job], breaker: bool) -> PassReport {
        self.limiter.interrupt().clear();
        self.progress.start_pass(label, jobs.len());

        let mut report = PassReport::default();
        let mut consecutive_failures = 0;

        for (index, job) in jobs.iter().enumerate() {
            if index > 0 {
                let message = format!("Next: {}", job);
                if self.limiter.wait(Some(&message)).is_err() {
                    warn!(pass = label, "Interrupted, ending pass");
                    report.interrupted = true;
                    report.skipped = jobs.len() - index;
                    break;
                }
            }

            let outcome = self.process(job);
            self.progress.job_finished(&outcome.job, &outcome.result);

            if outcome.succeeded() {
                consecutive_failures = 0;
                self.limiter.mark_call();
            } else {
                consecutive_failures += 1;
            }
            report.outcomes.push(outcome);

            let remaining = jobs.len() - index - 1;
            if breaker && consecutive_failures >= self.failure_threshold && remaining > 0 {
                if self.decisions.continue_after_failures(consecutive_failures) {
                    consecutive_failures = 0;
                } else {
                    warn!(pass = label, remaining, "Halting after repeated failures");
                    report.halted = true;
                    report.skipped = remaining;
                    break;
                }
            }
        }

        // Ctrl+C during the last job has no wait left to end
        if self.limiter.interrupt().is_set() {
            report.interrupted = true;
        }

        self.progress.finish_pass();
        report
    }

    fn process(&self, job: &Job) -> JobOutcome {
        let (result, attempts) = self.execute(job);
        match &result {
            Ok(path) => info!(job = %job, output = %path.display(), attempts, "Job succeeded"),
            Err(e) => warn!(job = %job, attempts, error = %e, "Job failed"),
        }
        JobOutcome {
            job: job.clone(),
            result,
            attempts,
        }
    }

    fn execute(&self, job: &Job) -> (Result<PathBuf, JobError>, u32) {
        let text = match fs::read_to_string(job.path()) {
            Ok(text) => text,
            Err(e) => {
                let err = JobError::ReadInput {
                    path: job.path().to_path_buf(),
                    message: e.to_string(),
                };
                return (Err(err), 0);
            }
        };
        let template = match self.prompts.load(job.prompt_id()) {
            Ok(template) => template,
            Err(e) => {
                let err = JobError::Prompt {
                    prompt_id: job.prompt_id().to_string(),
                    message: e.to_string(),
                };
                return (Err(err), 0);
            }
        };

        let title = job.title();
        let prompt = self.provider.format_prompt(&template, &text, &title);
        self.progress.job_started(job, text.len() as u64);

        let kind = self.provider.kind();
        match self.caller.call_remote(self.provider.as_ref(), &text, &prompt) {
            CallOutcome::Success { text: raw, attempts } => {
                let markdown = self.provider.to_markdown(&raw, &title);
                let path = self.output.path_for(job, self.provider.as_ref());
                let result = self
                    .output
                    .write(&path, &markdown)
                    .map(|_| path.clone())
                    .map_err(|e| JobError::WriteOutput {
                        path,
                        message: e.to_string(),
                    });
                (result, attempts)
            }
            CallOutcome::Rejected { attempts, error } => {
                (Err(JobError::rejected(kind, &error)), attempts)
            }
            CallOutcome::Exhausted {
                attempts,
                last_error,
            } => (Err(JobError::exhausted(kind, attempts, &last_error)), attempts),
        }
    }
}
