//! Test helper utilities

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use promptbatch::analyzer::{
    AnalysisProvider, BatchOrchestrator, DecisionPrompt, Job, OutputLayout, Pacing,
    PromptLibrary, ProviderError, ProviderKind, ProviderResult, RemoteCaller, RetryDecision,
    RetryPolicy,
};
use promptbatch::config::{PacingConfig, RateLimitConfig};
use promptbatch::{InterruptFlag, ManualClock, RateLimiter};

/// Prompt id written into every workspace.
pub const PROMPT_ID: &str = "summary";

/// Temporary input, prompts and output directories.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("input")).expect("Failed to create input dir");
        fs::create_dir_all(dir.path().join("prompts")).expect("Failed to create prompts dir");
        fs::write(
            dir.path().join("prompts").join("summary.txt"),
            "Summarize the chapter titled {title}.",
        )
        .expect("Failed to write prompt");
        Self { dir }
    }

    /// Write `input/<name>.md` containing `text`, returning its path.
    pub fn add_input(&self, name: &str, text: &str) -> PathBuf {
        let path = self.dir.path().join("input").join(format!("{}.md", name));
        fs::write(&path, text).expect("Failed to write input");
        path
    }

    /// One job per `(name, text)` pair, in order.
    pub fn jobs(&self, files: &[(&str, &str)]) -> Vec<Job> {
        files
            .iter()
            .map(|(name, text)| Job::new(self.add_input(name, text), PROMPT_ID))
            .collect()
    }

    pub fn prompts(&self) -> PromptLibrary {
        PromptLibrary::new(self.dir.path().join("prompts"))
    }

    pub fn output_root(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn output(&self) -> OutputLayout {
        OutputLayout::new(self.output_root())
    }
}

/// How the fake provider answers requests for one input text.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Fail with HTTP 503 for the first `times` requests, then succeed.
    Unavailable { times: u32 },
    /// Refuse the content for the first `times` requests, then succeed.
    Blocked { times: u32 },
}

impl Behavior {
    pub const ALWAYS: u32 = u32::MAX;
}

/// Provider whose answers are keyed by the input text.
///
/// Texts without a behavior always succeed. Every request is logged.
pub struct KeyedProvider {
    behaviors: HashMap<String, Behavior>,
    counts: Mutex<HashMap<String, u32>>,
    log: Arc<Mutex<Vec<String>>>,
    interrupt_on: Option<(String, InterruptFlag)>,
}

impl KeyedProvider {
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            counts: Mutex::new(HashMap::new()),
            log: Arc::new(Mutex::new(Vec::new())),
            interrupt_on: None,
        }
    }

    pub fn with(mut self, text: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(text.to_string(), behavior);
        self
    }

    /// Trigger `flag` while handling the request for `text`.
    pub fn interrupting_on(mut self, text: &str, flag: InterruptFlag) -> Self {
        self.interrupt_on = Some((text.to_string(), flag));
        self
    }

    /// Shared handle to the request log.
    pub fn log(&self) -> Arc<Mutex<Vec<String>>> {
        self.log.clone()
    }
}

impl AnalysisProvider for KeyedProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DeepSeek
    }

    fn model(&self) -> &str {
        "test-model"
    }

    fn send(&self, text: &str, _prompt: &str) -> ProviderResult<String> {
        self.log.lock().unwrap().push(text.to_string());
        if let Some((trigger, flag)) = &self.interrupt_on {
            if trigger == text {
                flag.trigger();
            }
        }

        let mut counts = self.counts.lock().unwrap();
        let seen = counts.entry(text.to_string()).or_insert(0);
        let previous = *seen;
        *seen += 1;

        match self.behaviors.get(text) {
            Some(Behavior::Unavailable { times }) if previous < *times => {
                Err(ProviderError::Http {
                    status: 503,
                    body: "Service Unavailable".to_string(),
                })
            }
            Some(Behavior::Blocked { times }) if previous < *times => Err(
                ProviderError::ContentBlocked("Content Exists Risk".to_string()),
            ),
            _ => Ok(format!("Analysis of {}", text)),
        }
    }

    fn is_transient(&self, error: &ProviderError) -> bool {
        !matches!(error, ProviderError::ContentBlocked(_))
    }

    fn update_credential(&mut self, _api_key: String) {}
}

/// Fixed answers that remember every question asked.
pub struct RecordingDecisions {
    pub keep_going: bool,
    pub retry: RetryDecision,
    pub breaker_asks: Arc<Mutex<Vec<usize>>>,
    pub retry_asks: Arc<Mutex<Vec<Vec<Job>>>>,
}

impl RecordingDecisions {
    pub fn new(keep_going: bool, retry: RetryDecision) -> Self {
        Self {
            keep_going,
            retry,
            breaker_asks: Arc::new(Mutex::new(Vec::new())),
            retry_asks: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl DecisionPrompt for RecordingDecisions {
    fn continue_after_failures(&mut self, consecutive: usize) -> bool {
        self.breaker_asks.lock().unwrap().push(consecutive);
        self.keep_going
    }

    fn retry_choice(&mut self, failed: &[Job]) -> RetryDecision {
        self.retry_asks.lock().unwrap().push(failed.to_vec());
        self.retry
    }
}

/// Orchestrator on a manual clock with no pacing and default retries.
pub fn orchestrator(
    ws: &Workspace,
    provider: KeyedProvider,
    decisions: RecordingDecisions,
    clock: Arc<ManualClock>,
    interrupt: InterruptFlag,
    wait_minutes: f64,
) -> BatchOrchestrator {
    let limiter = RateLimiter::new(
        RateLimitConfig {
            wait_minutes,
            show_progress: false,
        },
        clock.clone(),
        interrupt,
    );
    let caller = RemoteCaller::new(
        RetryPolicy::default(),
        Pacing::from(&PacingConfig::none()),
        clock,
    );
    BatchOrchestrator::new(
        Box::new(provider),
        caller,
        limiter,
        ws.prompts(),
        ws.output(),
        Box::new(decisions),
    )
}
