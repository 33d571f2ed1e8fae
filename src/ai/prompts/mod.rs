mod templates;

pub use templates::{
    render, FACTUAL_CORRECTNESS, GENERATE_TRANSCRIPT, PLAUSIBILITY, TRANSCRIPT_PLACEHOLDER,
};

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to read prompts file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid prompts file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// The three prompt templates used by an evaluation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSet {
    pub generate_transcript: String,
    pub factual_correctness: String,
    pub plausibility: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            generate_transcript: GENERATE_TRANSCRIPT.to_string(),
            factual_correctness: FACTUAL_CORRECTNESS.to_string(),
            plausibility: PLAUSIBILITY.to_string(),
        }
    }
}

impl PromptSet {
    pub fn new(
        generate_transcript: impl Into<String>,
        factual_correctness: impl Into<String>,
        plausibility: impl Into<String>,
    ) -> Self {
        Self {
            generate_transcript: generate_transcript.into(),
            factual_correctness: factual_correctness.into(),
            plausibility: plausibility.into(),
        }
    }

    /// Load templates from a JSON file with the three template keys.
    pub fn from_file(path: &Path) -> Result<Self, PromptError> {
        let display = path.display().to_string();
        let json = std::fs::read_to_string(path).map_err(|source| PromptError::Read {
            path: display.clone(),
            source,
        })?;
        let prompts: Self = serde_json::from_str(&json).map_err(|source| PromptError::Parse {
            path: display,
            source,
        })?;
        prompts.warn_missing_placeholders();
        Ok(prompts)
    }

    fn warn_missing_placeholders(&self) {
        for (name, template) in [
            ("factual_correctness", &self.factual_correctness),
            ("plausibility", &self.plausibility),
        ] {
            if !template.contains(TRANSCRIPT_PLACEHOLDER) {
                tracing::warn!(
                    "Prompt '{}' has no {} placeholder; the transcript will not be included",
                    name,
                    TRANSCRIPT_PLACEHOLDER
                );
            }
        }
    }

    pub fn transcript_prompt(&self) -> &str {
        &self.generate_transcript
    }

    pub fn factual_prompt(&self, transcript: &str) -> String {
        render(&self.factual_correctness, transcript)
    }

    pub fn plausibility_prompt(&self, transcript: &str) -> String {
        render(&self.plausibility, transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_prompt_set_renders_transcript() {
        let prompts = PromptSet::new(
            "Generate:",
            "Check facts: {transcript}",
            "Check plausibility: {transcript}",
        );
        assert_eq!(prompts.transcript_prompt(), "Generate:");
        assert_eq!(prompts.factual_prompt("T1"), "Check facts: T1");
        assert_eq!(prompts.plausibility_prompt("T1"), "Check plausibility: T1");
    }

    #[test]
    fn test_default_prompts_are_builtin() {
        let prompts = PromptSet::default();
        assert_eq!(prompts.generate_transcript, GENERATE_TRANSCRIPT);
        assert!(prompts.factual_prompt("XYZ").contains("XYZ"));
    }

    #[test]
    fn test_from_file_loads_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"generate_transcript": "Gen", "factual_correctness": "F {{transcript}}", "plausibility": "P {{transcript}}"}}"#
        )
        .unwrap();

        let prompts = PromptSet::from_file(file.path()).unwrap();
        assert_eq!(prompts.generate_transcript, "Gen");
        assert_eq!(prompts.factual_prompt("x"), "F x");
    }

    #[test]
    fn test_from_file_missing_is_read_error() {
        let err = PromptSet::from_file(Path::new("/no/such/prompts.json")).unwrap_err();
        assert!(matches!(err, PromptError::Read { .. }));
    }

    #[test]
    fn test_from_file_missing_key_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"generate_transcript": "Gen"}}"#).unwrap();

        let err = PromptSet::from_file(file.path()).unwrap_err();
        assert!(matches!(err, PromptError::Parse { .. }));
    }
}
