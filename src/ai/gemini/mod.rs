mod client;
mod resolver;
mod types;

pub use client::{model_path, GeminiApi, GeminiClient};
pub use resolver::{resolve_model, select_model, PRIORITY_SUFFIXES};
pub use types::GeminiError;
pub use types::{
    Candidate, Content, FileData, GenerateRequest, GenerateResponse, GenerationConfig,
    ListModelsResponse, ModelDescriptor, Part, PromptFeedback, UploadFileResponse, UploadedFile,
    UsageMetadata, DEFAULT_GEMINI_MODEL, GEMINI_API_BASE, GENERATE_CONTENT_METHOD,
};
