//! Picks a concrete Gemini model from whatever the key can currently see.

use super::client::GeminiApi;
use super::types::{ModelDescriptor, DEFAULT_GEMINI_MODEL, GENERATE_CONTENT_METHOD};

/// Model-name suffixes in order of preference.
pub const PRIORITY_SUFFIXES: [&str; 5] = [
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
    "gemini-1.5-flash-8b",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
];

/// Select a model name from a listing.
///
/// Every candidate is checked against the first suffix before any is checked
/// against the second, so the earliest suffix present anywhere wins. Falls back
/// to the first capable candidate, and returns `None` when nothing can generate.
pub fn select_model<'a>(models: &'a [ModelDescriptor], priority: &[&str]) -> Option<&'a str> {
    let candidates: Vec<&ModelDescriptor> = models
        .iter()
        .filter(|m| m.supports(GENERATE_CONTENT_METHOD))
        .collect();

    for suffix in priority {
        if let Some(model) = candidates.iter().find(|m| m.name.ends_with(suffix)) {
            return Some(model.name.as_str());
        }
    }

    candidates.first().map(|m| m.name.as_str())
}

/// Resolve the model to use for one generation call.
///
/// Listing failures are not fatal: they are logged and the default model is used.
pub async fn resolve_model<A: GeminiApi + ?Sized>(api: &A) -> String {
    let models = match api.list_models().await {
        Ok(models) => models,
        Err(e) => {
            tracing::warn!(
                "Could not list models, defaulting to {}. Error: {}",
                DEFAULT_GEMINI_MODEL,
                e
            );
            return DEFAULT_GEMINI_MODEL.to_string();
        }
    };

    match select_model(&models, &PRIORITY_SUFFIXES) {
        Some(name) => {
            tracing::info!("Using Gemini model: {}", name);
            name.to_string()
        }
        None => {
            tracing::warn!(
                "No model supports {}, defaulting to {}",
                GENERATE_CONTENT_METHOD,
                DEFAULT_GEMINI_MODEL
            );
            DEFAULT_GEMINI_MODEL.to_string()
        }
    }
}
