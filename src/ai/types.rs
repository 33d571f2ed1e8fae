use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::gemini::GeminiError;
use super::openai::OpenAiError;

/// Handle to a file uploaded to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Gemini file name (`files/...`) or OpenAI file id.
    pub id: String,
    /// Gemini file URI used in `file_data` parts.
    pub uri: Option<String>,
    pub mime_type: String,
    pub display_name: String,
}

/// Server-held conversation thread (Assistants only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationThread {
    pub id: String,
}

/// Lifecycle status of an assistant run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
    Expired,
    Incomplete,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Incomplete => "incomplete",
            Self::Unknown => "unknown",
        }
    }

    /// Statuses that end a run without a usable result.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Failed | Self::Cancelled | Self::Expired | Self::Incomplete
        )
    }

    pub fn is_terminal(&self) -> bool {
        *self == Self::Completed || self.is_fatal()
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error from either provider client.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error(transparent)]
    Gemini(#[from] GeminiError),
    #[error(transparent)]
    OpenAi(#[from] OpenAiError),
}
