use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default host for the Generative Language API
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Model used when the model list is unavailable or empty
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-8b";

/// Generation method a model must support to be selectable
pub const GENERATE_CONTENT_METHOD: &str = "generateContent";

/// Errors that can occur when interacting with the Gemini API.
#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Request body for content generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// Content message (role + parts).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Part of a content message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    FileData { file_data: FileData },
    Other(serde_json::Value),
}

/// Reference to an uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

/// Configuration for content generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<i32>,
}

/// Response from content generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if it has any.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Why no text came back: a prompt block reason or the finish reason.
    pub fn empty_reason(&self) -> String {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return format!("prompt blocked ({})", reason);
        }

        match self.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
            Some(reason) => format!("no text in response (finish reason {})", reason),
            None => "no text in response".to_string(),
        }
    }
}

/// A generated candidate response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

/// Token usage metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: i32,
    #[serde(default)]
    pub candidates_token_count: i32,
    #[serde(default)]
    pub total_token_count: i32,
}

/// A model exposed by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelDescriptor {
    pub fn supports(&self, method: &str) -> bool {
        self.supported_generation_methods.iter().any(|m| m == method)
    }
}

/// One page of `models.list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
    pub next_page_token: Option<String>,
}

/// File resource returned by the Files API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub uri: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadFileResponse {
    pub file: UploadedFile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_error_display() {
        let err = GeminiError::Api("rate_limited".into());
        assert_eq!(err.to_string(), "API error: rate_limited");

        let err = GeminiError::Parse("invalid json".into());
        assert_eq!(err.to_string(), "Parse error: invalid json");
    }

    #[test]
    fn test_content_deserialization_missing_parts() {
        let json = r#"{"role": "model"}"#;
        let content: Content = serde_json::from_str(json).unwrap();
        assert_eq!(content.role, "model");
        assert!(content.parts.is_empty());
    }

    #[test]
    fn test_file_data_part_serialization() {
        let part = Part::FileData {
            file_data: FileData {
                mime_type: "application/pdf".into(),
                file_uri: "https://example.test/files/abc".into(),
            },
        };
        let json = serde_json::to_string(&part).unwrap();
        assert_eq!(
            json,
            r#"{"file_data":{"mime_type":"application/pdf","file_uri":"https://example.test/files/abc"}}"#
        );
    }

    #[test]
    fn test_generate_request_skips_none_fields() {
        let request = GenerateRequest {
            contents: vec![],
            generation_config: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("generation_config"));
    }

    #[test]
    fn test_generate_response_joins_text_parts() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Hello "}, {"inlineData": {"mimeType": "image/png", "data": ""}}, {"text": "back!"}]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 10,
                "candidatesTokenCount": 5,
                "totalTokenCount": 15
            }
        }"#;

        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("Hello back!".into()));

        let usage = response.usage_metadata.unwrap();
        assert_eq!(usage.prompt_token_count, 10);
        assert_eq!(usage.total_token_count, 15);
    }

    #[test]
    fn test_blocked_prompt_reports_reason() {
        let json = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), None);
        assert_eq!(response.empty_reason(), "prompt blocked (SAFETY)");
    }

    #[test]
    fn test_candidate_without_content_reports_finish_reason() {
        let json = r#"{"candidates": [{"finishReason": "RECITATION"}]}"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), None);
        assert!(response.empty_reason().contains("RECITATION"));
    }

    #[test]
    fn test_list_models_response_deserialization() {
        let json = r#"{
            "models": [
                {"name": "models/gemini-1.5-pro", "supportedGenerationMethods": ["generateContent", "countTokens"]},
                {"name": "models/embedding-001", "supportedGenerationMethods": ["embedContent"]}
            ],
            "nextPageToken": "abc"
        }"#;

        let page: ListModelsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(page.models.len(), 2);
        assert!(page.models[0].supports(GENERATE_CONTENT_METHOD));
        assert!(!page.models[1].supports(GENERATE_CONTENT_METHOD));
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_upload_file_response_deserialization() {
        let json = r#"{"file": {
            "name": "files/abc-123",
            "displayName": "case.pdf",
            "mimeType": "application/pdf",
            "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc-123",
            "state": "ACTIVE"
        }}"#;

        let response: UploadFileResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.file.name, "files/abc-123");
        assert_eq!(response.file.mime_type.as_deref(), Some("application/pdf"));
    }
}
