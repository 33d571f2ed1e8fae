//! Completion strategies: turn a prompt (plus an optional attached file) into
//! the model's final text.
//!
//! - [`DirectStrategy`] calls Gemini's generateContent once per prompt.
//! - [`PollingStrategy`] posts to an assistant thread, starts a run and polls
//!   it until a terminal status.

mod direct;
mod polling;

pub use direct::DirectStrategy;
pub use polling::{PollConfig, PollingStrategy, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use super::types::{ProviderError, RemoteFile, RunStatus};

/// Errors from a single completion.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Run failed with status: {0}")]
    RunStatus(RunStatus),
    #[error("Run did not finish after {polls} status checks ({waited:?})")]
    Timeout { polls: u32, waited: Duration },
    #[error("Empty response: {0}")]
    EmptyResponse(String),
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl From<super::gemini::GeminiError> for CompletionError {
    fn from(e: super::gemini::GeminiError) -> Self {
        Self::Provider(e.into())
    }
}

impl From<super::openai::OpenAiError> for CompletionError {
    fn from(e: super::openai::OpenAiError) -> Self {
        Self::Provider(e.into())
    }
}

/// Per-call context for a completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskContext<'a> {
    /// File the model should read for this prompt, if any.
    pub attachment: Option<&'a RemoteFile>,
}

impl<'a> TaskContext<'a> {
    pub fn with_file(file: &'a RemoteFile) -> Self {
        Self {
            attachment: Some(file),
        }
    }

    pub fn text_only() -> Self {
        Self::default()
    }
}

/// A protocol for obtaining a model's final text output.
#[async_trait]
pub trait CompletionStrategy: Send + Sync {
    async fn execute(
        &self,
        prompt: &str,
        context: &TaskContext<'_>,
    ) -> Result<String, CompletionError>;
}
