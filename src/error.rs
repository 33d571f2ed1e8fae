use std::path::PathBuf;
use thiserror::Error;

use crate::ai::completion::CompletionError;
use crate::ai::prompts::PromptError;
use crate::ai::types::ProviderError;

/// Errors that end an evaluation run.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("The file '{}' was not found.", .0.display())]
    NotFound(PathBuf),
    #[error("Upload failed: {0}")]
    Upload(ProviderError),
    #[error("Session setup failed: {0}")]
    Setup(ProviderError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("Interrupted")]
    Interrupted,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Prompts error: {0}")]
    Prompts(String),
}

impl From<PromptError> for EvalError {
    fn from(e: PromptError) -> Self {
        EvalError::Prompts(e.to_string())
    }
}
