//! Command line and environment configuration.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::ai::completion::PollConfig;
use crate::ai::gemini::{GeminiClient, GEMINI_API_BASE};
use crate::ai::openai::{OpenAiClient, DEFAULT_ASSISTANT_MODEL, OPENAI_API_BASE};
use crate::ai::prompts::PromptSet;
use crate::ai::provider::{AssistantProvider, GeminiProvider, Provider};
use crate::error::EvalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    /// Gemini generateContent
    Gemini,
    /// OpenAI Assistants
    Openai,
}

#[derive(Parser, Debug)]
#[command(name = "mdt-eval")]
#[command(about = "Generate and evaluate an MDT transcript from a PDF case study")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a case study and run the three evaluation tasks
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Path to the PDF case study
    pub pdf: Option<PathBuf>,

    #[arg(long, value_enum, env = "MDT_PROVIDER", default_value = "gemini")]
    pub provider: ProviderKind,

    /// Model to use; for Gemini this skips automatic model selection
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long, env = "MDT_POLL_INTERVAL_SECS", default_value_t = 2)]
    pub poll_interval_secs: u64,

    /// Give up on a run after this many seconds (0 waits forever)
    #[arg(long, env = "MDT_MAX_WAIT_SECS", default_value_t = 600)]
    pub max_wait_secs: u64,

    /// Give up on a run after this many status checks
    #[arg(long, env = "MDT_MAX_POLLS")]
    pub max_polls: Option<u32>,

    /// JSON file overriding the built-in prompt templates
    #[arg(long, env = "MDT_PROMPTS_FILE")]
    pub prompts: Option<PathBuf>,

    #[arg(long, env = "GEMINI_API_KEY", hide = true, hide_env_values = true, default_value = "")]
    pub gemini_api_key: String,

    #[arg(long, env = "GEMINI_MODEL", hide = true)]
    pub gemini_model: Option<String>,

    #[arg(long, env = "GEMINI_API_BASE", hide = true, default_value = GEMINI_API_BASE)]
    pub gemini_api_base: String,

    #[arg(long, env = "OPENAI_API_KEY", hide = true, hide_env_values = true, default_value = "")]
    pub openai_api_key: String,

    #[arg(long, env = "OPENAI_MODEL", hide = true, default_value = DEFAULT_ASSISTANT_MODEL)]
    pub openai_model: String,

    #[arg(long, env = "OPENAI_API_BASE", hide = true, default_value = OPENAI_API_BASE)]
    pub openai_api_base: String,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub base_url: String,
    /// `None` lets the resolver pick a model per call.
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderKind,
    pub gemini: GeminiSettings,
    pub openai: OpenAiSettings,
    pub poll: PollConfig,
    pub prompts_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_args(args: &RunArgs) -> Result<Self, EvalError> {
        if args.poll_interval_secs == 0 {
            return Err(EvalError::Config(
                "poll interval must be at least 1 second".to_string(),
            ));
        }
        if args.max_polls == Some(0) {
            return Err(EvalError::Config(
                "max polls must be at least 1".to_string(),
            ));
        }

        // --model applies to whichever provider is selected.
        let (gemini_model, openai_model) = match (args.provider, &args.model) {
            (ProviderKind::Gemini, Some(m)) => (Some(m.clone()), args.openai_model.clone()),
            (ProviderKind::Openai, Some(m)) => (args.gemini_model.clone(), m.clone()),
            (_, None) => (args.gemini_model.clone(), args.openai_model.clone()),
        };

        Ok(Self {
            provider: args.provider,
            gemini: GeminiSettings {
                api_key: args.gemini_api_key.clone(),
                base_url: args.gemini_api_base.clone(),
                model: gemini_model.filter(|m| !m.trim().is_empty()),
            },
            openai: OpenAiSettings {
                api_key: args.openai_api_key.clone(),
                base_url: args.openai_api_base.clone(),
                model: openai_model,
            },
            poll: PollConfig {
                interval: Duration::from_secs(args.poll_interval_secs),
                max_wait: (args.max_wait_secs > 0).then(|| Duration::from_secs(args.max_wait_secs)),
                max_polls: args.max_polls,
            },
            prompts_file: args.prompts.clone(),
        })
    }

    pub fn load_prompts(&self) -> Result<PromptSet, EvalError> {
        match &self.prompts_file {
            Some(path) => {
                tracing::info!("Loading prompts from {}", path.display());
                Ok(PromptSet::from_file(path)?)
            }
            None => Ok(PromptSet::default()),
        }
    }

    pub fn build_provider(&self) -> Box<dyn Provider> {
        match self.provider {
            ProviderKind::Gemini => {
                if self.gemini.api_key.is_empty() {
                    tracing::warn!("GEMINI_API_KEY is not set");
                }
                let client = GeminiClient::new(self.gemini.api_key.clone())
                    .with_base_url(&self.gemini.base_url);
                Box::new(GeminiProvider::new(
                    Arc::new(client),
                    self.gemini.model.clone(),
                ))
            }
            ProviderKind::Openai => {
                if self.openai.api_key.is_empty() {
                    tracing::warn!("OPENAI_API_KEY is not set");
                }
                let client = OpenAiClient::new(self.openai.api_key.clone())
                    .with_base_url(&self.openai.base_url);
                Box::new(AssistantProvider::new(
                    Arc::new(client),
                    self.openai.model.clone(),
                    self.poll,
                ))
            }
        }
    }
}
