mod client;
mod types;

pub use client::{AssistantApi, OpenAiClient};
pub use types::OpenAiError;
pub use types::{
    Assistant, Attachment, CreateAssistantRequest, CreateMessageRequest, CreateRunRequest,
    DeletionStatus, FileObject, ListResponse, MessageContent, Run, RunError, TextContent, Thread,
    ThreadMessage, ToolSpec, ASSISTANTS_BETA, DEFAULT_ASSISTANT_MODEL, OPENAI_API_BASE,
};
