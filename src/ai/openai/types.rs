use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::types::RunStatus;

/// Default base URL for the OpenAI REST API
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Model used for the assistant when none is configured
pub const DEFAULT_ASSISTANT_MODEL: &str = "gpt-4o";

/// Beta header value required by the Assistants API
pub const ASSISTANTS_BETA: &str = "assistants=v2";

/// Errors that can occur when interacting with the OpenAI API.
#[derive(Error, Debug)]
pub enum OpenAiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// File object returned by `POST /files`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileObject {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
}

/// Tool enabled on an assistant or attachment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ToolSpec {
    pub fn file_search() -> Self {
        Self {
            kind: "file_search".to_string(),
        }
    }
}

/// Request body for `POST /assistants`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAssistantRequest {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub tools: Vec<ToolSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Assistant {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thread {
    pub id: String,
}

/// File attached to a thread message.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Attachment {
    pub file_id: String,
    pub tools: Vec<ToolSpec>,
}

/// Request body for `POST /threads/{id}/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateMessageRequest {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

impl CreateMessageRequest {
    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
            attachments: None,
        }
    }

    /// Attach a file for the `file_search` tool.
    pub fn with_file(mut self, file_id: &str) -> Self {
        self.attachments
            .get_or_insert_with(Vec::new)
            .push(Attachment {
                file_id: file_id.to_string(),
                tools: vec![ToolSpec::file_search()],
            });
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRunRequest {
    pub assistant_id: String,
}

/// Run object; only the fields the poll loop reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunError {
    pub code: String,
    pub message: String,
}

/// Message stored on a thread.
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// The first text block of the message, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|c| match c {
            MessageContent::Text { text } => Some(text.value.as_str()),
            MessageContent::Other => None,
        })
    }
}

/// Content block of a thread message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    pub value: String,
}

/// Paginated list wrapper used by list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
}

/// Response body of delete endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletionStatus {
    pub id: String,
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_error_display() {
        let err = OpenAiError::Api("HTTP 401: Incorrect API key provided".into());
        assert_eq!(err.to_string(), "API error: HTTP 401: Incorrect API key provided");
    }

    #[test]
    fn test_create_assistant_request_serialization() {
        let request = CreateAssistantRequest {
            name: "Evaluator".into(),
            instructions: "Be helpful".into(),
            model: DEFAULT_ASSISTANT_MODEL.into(),
            tools: vec![ToolSpec::file_search()],
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""tools":[{"type":"file_search"}]"#));
        assert!(json.contains(r#""model":"gpt-4o""#));
    }

    #[test]
    fn test_message_request_without_attachments_skips_field() {
        let json = serde_json::to_string(&CreateMessageRequest::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }

    #[test]
    fn test_message_request_with_file_attachment() {
        let request = CreateMessageRequest::user("read this").with_file("file-123");
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(
            r#""attachments":[{"file_id":"file-123","tools":[{"type":"file_search"}]}]"#
        ));
    }

    #[test]
    fn test_run_deserialization() {
        let json = r#"{"id": "run_1", "object": "thread.run", "status": "failed",
            "last_error": {"code": "server_error", "message": "Something went wrong"}}"#;
        let run: Run = serde_json::from_str(json).unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.last_error.unwrap().code, "server_error");
    }

    #[test]
    fn test_thread_message_first_text_skips_other_blocks() {
        let json = r#"{
            "id": "msg_1",
            "role": "assistant",
            "content": [
                {"type": "image_file", "image_file": {"file_id": "file-img"}},
                {"type": "text", "text": {"value": "Transcript body", "annotations": []}},
                {"type": "text", "text": {"value": "Second block", "annotations": []}}
            ]
        }"#;
        let message: ThreadMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.first_text(), Some("Transcript body"));
    }

    #[test]
    fn test_list_response_deserialization() {
        let json = r#"{"object": "list", "data": [{"id": "msg_2", "role": "assistant", "content": []}],
            "first_id": "msg_2", "last_id": "msg_2", "has_more": true}"#;
        let list: ListResponse<ThreadMessage> = serde_json::from_str(json).unwrap();
        assert_eq!(list.data.len(), 1);
        assert_eq!(list.data[0].first_text(), None);
    }
}
