use async_trait::async_trait;
use std::sync::Arc;

use super::{CompletionError, CompletionStrategy, TaskContext};
use crate::ai::gemini::{resolve_model, Content, FileData, GeminiApi, GenerateRequest, Part};

/// Single blocking generateContent call per prompt.
pub struct DirectStrategy<A: GeminiApi> {
    api: Arc<A>,
    /// Fixed model; when unset the model is resolved for every call.
    model: Option<String>,
}

impl<A: GeminiApi> DirectStrategy<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api, model: None }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model.filter(|m| !m.is_empty());
        self
    }

    fn build_request(prompt: &str, context: &TaskContext<'_>) -> GenerateRequest {
        let mut parts = vec![Part::Text {
            text: prompt.to_string(),
        }];

        if let Some(file) = context.attachment {
            match &file.uri {
                Some(uri) => parts.push(Part::FileData {
                    file_data: FileData {
                        mime_type: file.mime_type.clone(),
                        file_uri: uri.clone(),
                    },
                }),
                None => tracing::warn!("File {} has no URI, sending prompt without it", file.id),
            }
        }

        GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: None,
        }
    }
}

#[async_trait]
impl<A: GeminiApi> CompletionStrategy for DirectStrategy<A> {
    async fn execute(
        &self,
        prompt: &str,
        context: &TaskContext<'_>,
    ) -> Result<String, CompletionError> {
        tracing::info!("Generating response from Gemini...");
        let model = match &self.model {
            Some(model) => model.clone(),
            None => resolve_model(self.api.as_ref()).await,
        };

        let request = Self::build_request(prompt, context);
        let response = self.api.generate_content(&model, &request).await?;

        if let Some(usage) = &response.usage_metadata {
            tracing::debug!(
                "Token usage: {} prompt, {} candidates, {} total",
                usage.prompt_token_count,
                usage.candidates_token_count,
                usage.total_token_count
            );
        }

        let text = response
            .text()
            .ok_or_else(|| CompletionError::EmptyResponse(response.empty_reason()))?;
        tracing::info!("Response received.");
        Ok(text)
    }
}
