//! User-friendly errors for individual jobs.
//!
//! A `JobError` never aborts a batch. The orchestrator records it against
//! the job and moves on; the messages are what the user sees in the summary.

use std::fmt;
use std::path::PathBuf;

use crate::analyzer::provider::{ProviderError, ProviderKind};

/// Why a single job failed.
#[derive(Debug)]
pub enum JobError {
    /// The input file could not be read.
    ReadInput {
        path: PathBuf,
        message: String,
    },

    /// The prompt template could not be resolved or read.
    Prompt {
        prompt_id: String,
        message: String,
    },

    /// The provider refused the request; retrying would not help.
    Rejected {
        provider: ProviderKind,
        reason: String,
    },

    /// Every attempt failed with a transient error.
    Exhausted {
        provider: ProviderKind,
        attempts: u32,
        last_error: String,
    },

    /// The result could not be written.
    WriteOutput {
        path: PathBuf,
        message: String,
    },
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::ReadInput { path, message } => {
                write!(f, "Could not read {}: {}", path.display(), message)
            }
            JobError::Prompt { prompt_id, message } => {
                write!(f, "Prompt '{}' unavailable: {}", prompt_id, message)
            }
            JobError::Rejected { provider, reason } => {
                write!(f, "{} rejected the request: {}", provider, reason)
            }
            JobError::Exhausted {
                provider,
                attempts,
                last_error,
            } => {
                write!(
                    f,
                    "{} still failing after {} attempt{}: {}",
                    provider,
                    attempts,
                    if *attempts == 1 { "" } else { "s" },
                    last_error
                )
            }
            JobError::WriteOutput { path, message } => {
                write!(f, "Could not write {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for JobError {}

impl JobError {
    pub fn rejected(provider: ProviderKind, error: &ProviderError) -> Self {
        JobError::Rejected {
            provider,
            reason: error.to_string(),
        }
    }

    pub fn exhausted(provider: ProviderKind, attempts: u32, error: &ProviderError) -> Self {
        JobError::Exhausted {
            provider,
            attempts,
            last_error: error.to_string(),
        }
    }
}
