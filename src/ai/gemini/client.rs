use super::types::{
    GeminiError, GenerateRequest, GenerateResponse, ListModelsResponse, ModelDescriptor,
    UploadFileResponse, UploadedFile, GEMINI_API_BASE,
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::path::Path;

const MODELS_PAGE_SIZE: &str = "1000";

/// Operations the Gemini completion path needs from the API.
#[async_trait]
pub trait GeminiApi: Send + Sync {
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, GeminiError>;

    async fn upload_file(&self, path: &Path, mime_type: &str) -> Result<UploadedFile, GeminiError>;

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, GeminiError>;

    async fn delete_file(&self, name: &str) -> Result<(), GeminiError>;
}

/// Client for interacting with the Gemini API.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new client with API key authentication.
    pub fn new(api_key: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    /// Point the client at a different API host.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v1beta/{}", self.base_url, path)
    }

    /// Turn a non-success response into `GeminiError::Api` with the provider's message.
    async fn check(response: Response) -> Result<Response, GeminiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await?;
        tracing::error!("Gemini API error ({}): {}", status, error_text);

        let error_msg = serde_json::from_str::<serde_json::Value>(&error_text)
            .ok()
            .and_then(|json| {
                json.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or(error_text);

        Err(GeminiError::Api(format!(
            "HTTP {}: {}",
            status.as_u16(),
            error_msg
        )))
    }

    /// List every model visible to this key, following pagination.
    pub async fn list_models(&self) -> Result<Vec<ModelDescriptor>, GeminiError> {
        let url = self.api_url("models");
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut req = self
                .http
                .get(&url)
                .query(&[("key", self.api_key.as_str()), ("pageSize", MODELS_PAGE_SIZE)]);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token.as_str())]);
            }

            let response = Self::check(req.send().await?).await?;
            let page: ListModelsResponse = response.json().await?;
            models.extend(page.models);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("Listed {} Gemini models", models.len());
        Ok(models)
    }

    /// Upload a local file with the resumable upload protocol.
    pub async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
    ) -> Result<UploadedFile, GeminiError> {
        let bytes = tokio::fs::read(path).await?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());

        let start_url = format!("{}/upload/v1beta/files", self.base_url);
        tracing::debug!("Starting resumable upload at: {}", start_url);

        let start = self
            .http
            .post(&start_url)
            .query(&[("key", self.api_key.as_str())])
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        let start = Self::check(start).await?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| GeminiError::Parse("Missing x-goog-upload-url header".into()))?;

        let response = self
            .http
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let uploaded: UploadFileResponse = response.json().await?;
        Ok(uploaded.file)
    }

    /// Generate content with the given model (`models/...` or bare name).
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, GeminiError> {
        let url = self.api_url(&format!("{}:generateContent", model_path(model)));
        tracing::debug!("Making Gemini API request to: {}", url);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    /// Delete an uploaded file by name (`files/...`).
    pub async fn delete_file(&self, name: &str) -> Result<(), GeminiError> {
        let url = self.api_url(name);
        let response = self
            .http
            .delete(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl GeminiApi for GeminiClient {
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, GeminiError> {
        GeminiClient::list_models(self).await
    }

    async fn upload_file(&self, path: &Path, mime_type: &str) -> Result<UploadedFile, GeminiError> {
        GeminiClient::upload_file(self, path, mime_type).await
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, GeminiError> {
        GeminiClient::generate_content(self, model, request).await
    }

    async fn delete_file(&self, name: &str) -> Result<(), GeminiError> {
        GeminiClient::delete_file(self, name).await
    }
}

/// Qualify a bare model name with the `models/` collection prefix.
pub fn model_path(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}
