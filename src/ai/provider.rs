//! Provider lifecycles: upload, per-run setup, and release of remote resources.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use super::completion::{CompletionStrategy, DirectStrategy, PollConfig, PollingStrategy};
use super::gemini::GeminiApi;
use super::openai::{AssistantApi, CreateAssistantRequest, ToolSpec};
use super::types::{ConversationThread, ProviderError, RemoteFile};
use crate::files;
use crate::session::{RemoteResource, ResourceScope};

const ASSISTANT_NAME: &str = "MDT Generator & Evaluator";
const ASSISTANT_INSTRUCTIONS: &str = "You are a helpful medical AI assistant capable of analyzing case studies and generating transcripts.";

/// A hosted model provider.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Upload the case file.
    async fn upload(&self, path: &Path) -> Result<RemoteFile, ProviderError>;

    /// Create whatever the run needs and return its completion strategy.
    /// Every remote resource created here is registered with `scope`.
    async fn open_session(
        &self,
        scope: &mut ResourceScope,
    ) -> Result<Box<dyn CompletionStrategy>, ProviderError>;

    async fn release(&self, resource: &RemoteResource) -> Result<(), ProviderError>;
}

/// Gemini with direct generateContent calls.
pub struct GeminiProvider<A: GeminiApi> {
    api: Arc<A>,
    model: Option<String>,
}

impl<A: GeminiApi> GeminiProvider<A> {
    pub fn new(api: Arc<A>, model: Option<String>) -> Self {
        Self { api, model }
    }
}

#[async_trait]
impl<A: GeminiApi + 'static> Provider for GeminiProvider<A> {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn upload(&self, path: &Path) -> Result<RemoteFile, ProviderError> {
        let mime_type = files::detect_mime_type(path);
        tracing::info!("Uploading file: {} ({})", path.display(), mime_type);

        let uploaded = self.api.upload_file(path, &mime_type).await?;
        tracing::info!("File uploaded. Name: {}", uploaded.name);

        Ok(RemoteFile {
            id: uploaded.name,
            uri: Some(uploaded.uri),
            mime_type: uploaded.mime_type.unwrap_or(mime_type),
            display_name: uploaded
                .display_name
                .unwrap_or_else(|| files::display_name(path)),
        })
    }

    async fn open_session(
        &self,
        _scope: &mut ResourceScope,
    ) -> Result<Box<dyn CompletionStrategy>, ProviderError> {
        Ok(Box::new(
            DirectStrategy::new(self.api.clone()).with_model(self.model.clone()),
        ))
    }

    async fn release(&self, resource: &RemoteResource) -> Result<(), ProviderError> {
        match resource {
            RemoteResource::File(file) => Ok(self.api.delete_file(&file.id).await?),
            RemoteResource::Assistant(id) => {
                tracing::warn!("Gemini has no assistant {} to delete", id);
                Ok(())
            }
        }
    }
}

/// OpenAI Assistants with thread runs polled to completion.
pub struct AssistantProvider<A: AssistantApi> {
    api: Arc<A>,
    model: String,
    poll: PollConfig,
}

impl<A: AssistantApi> AssistantProvider<A> {
    pub fn new(api: Arc<A>, model: String, poll: PollConfig) -> Self {
        Self { api, model, poll }
    }
}

#[async_trait]
impl<A: AssistantApi + 'static> Provider for AssistantProvider<A> {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn upload(&self, path: &Path) -> Result<RemoteFile, ProviderError> {
        tracing::info!("Uploading file: {}", path.display());

        let uploaded = self.api.upload_file(path).await?;
        tracing::info!("File uploaded. ID: {}", uploaded.id);

        Ok(RemoteFile {
            id: uploaded.id,
            uri: None,
            mime_type: files::detect_mime_type(path),
            display_name: uploaded
                .filename
                .unwrap_or_else(|| files::display_name(path)),
        })
    }

    async fn open_session(
        &self,
        scope: &mut ResourceScope,
    ) -> Result<Box<dyn CompletionStrategy>, ProviderError> {
        tracing::info!("Creating Assistant...");
        let assistant = self
            .api
            .create_assistant(&CreateAssistantRequest {
                name: ASSISTANT_NAME.to_string(),
                instructions: ASSISTANT_INSTRUCTIONS.to_string(),
                model: self.model.clone(),
                tools: vec![ToolSpec::file_search()],
            })
            .await?;
        tracing::info!("Assistant created. ID: {}", assistant.id);
        scope.register(RemoteResource::Assistant(assistant.id.clone()));

        tracing::info!("Creating Thread...");
        let thread = self.api.create_thread().await?;
        tracing::info!("Thread created. ID: {}", thread.id);

        let strategy = PollingStrategy::new(
            self.api.clone(),
            assistant.id,
            ConversationThread { id: thread.id },
        )
        .with_poll_config(self.poll);
        Ok(Box::new(strategy))
    }

    async fn release(&self, resource: &RemoteResource) -> Result<(), ProviderError> {
        match resource {
            RemoteResource::File(file) => Ok(self.api.delete_file(&file.id).await?),
            RemoteResource::Assistant(id) => Ok(self.api.delete_assistant(id).await?),
        }
    }
}
