//! Batch analysis of text files with remote LLM providers.
//!
//! # Module Structure
//!
//! - [`provider`] - the provider trait and the Gemini, Kimi and DeepSeek clients
//! - [`retry`] - the shared retry-with-backoff routine
//! - [`batch`] - the orchestrator: passes, failure breaker, retry pass
//! - [`decision`] - the user decision points
//! - [`prompt`] - prompt templates and markdown rendering
//! - [`output`] - result file layout
//! - [`progress`] - progress bars and per-file lines

pub mod batch;
pub mod decision;
mod error;
mod job;
pub mod output;
pub mod progress;
pub mod prompt;
pub mod provider;
pub mod retry;

pub use batch::{BatchOrchestrator, BatchReport, JobOutcome, PassReport};
pub use decision::{DecisionPrompt, PresetDecisions, RetryDecision, TerminalDecisions};
pub use error::JobError;
pub use job::{discover_inputs, Job};
pub use output::OutputLayout;
pub use progress::BatchProgress;
pub use prompt::{PromptError, PromptLibrary, PromptTemplate};
pub use provider::{
    AnalysisProvider, ProviderError, ProviderKind, ProviderOptions, ProviderResult, RateLimitInfo,
    GEMINI_MODELS,
};
pub use retry::{CallOutcome, Pacing, RemoteCaller, RetryPolicy};
