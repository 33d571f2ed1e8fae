pub mod completion;
pub mod gemini;
pub mod openai;
pub mod prompts;
pub mod provider;
pub mod types;

pub use completion::{CompletionError, CompletionStrategy, TaskContext};
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use prompts::PromptSet;
pub use provider::{AssistantProvider, GeminiProvider, Provider};
pub use types::{ProviderError, RemoteFile, RunStatus};
