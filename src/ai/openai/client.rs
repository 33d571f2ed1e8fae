use super::types::{
    Assistant, CreateAssistantRequest, CreateMessageRequest, CreateRunRequest, DeletionStatus,
    FileObject, ListResponse, OpenAiError, Run, Thread, ThreadMessage, ASSISTANTS_BETA,
    OPENAI_API_BASE,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Operations the assistant completion path needs from the API.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn upload_file(&self, path: &Path) -> Result<FileObject, OpenAiError>;

    async fn delete_file(&self, file_id: &str) -> Result<(), OpenAiError>;

    async fn create_assistant(
        &self,
        request: &CreateAssistantRequest,
    ) -> Result<Assistant, OpenAiError>;

    async fn delete_assistant(&self, assistant_id: &str) -> Result<(), OpenAiError>;

    async fn create_thread(&self) -> Result<Thread, OpenAiError>;

    async fn create_message(
        &self,
        thread_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<ThreadMessage, OpenAiError>;

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, OpenAiError>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, OpenAiError>;

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, OpenAiError>;

    /// Most recent message on the thread.
    async fn latest_message(&self, thread_id: &str) -> Result<Option<ThreadMessage>, OpenAiError>;
}

/// Client for the OpenAI Files and Assistants APIs.
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            base_url: OPENAI_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.api_key)
            .header("OpenAI-Beta", ASSISTANTS_BETA)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, OpenAiError> {
        let response = self.authorized(req).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn check(response: Response) -> Result<Response, OpenAiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await?;
        tracing::error!("OpenAI API error ({}): {}", status, error_text);

        let error_msg = serde_json::from_str::<serde_json::Value>(&error_text)
            .ok()
            .and_then(|json| {
                json.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or(error_text);

        Err(OpenAiError::Api(format!(
            "HTTP {}: {}",
            status.as_u16(),
            error_msg
        )))
    }

    fn expect_deleted(status: DeletionStatus) -> Result<(), OpenAiError> {
        if status.deleted {
            Ok(())
        } else {
            Err(OpenAiError::Api(format!("{} was not deleted", status.id)))
        }
    }

    /// Upload a file for use with assistants.
    pub async fn upload_file(&self, path: &Path) -> Result<FileObject, OpenAiError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());

        let form = Form::new()
            .text("purpose", "assistants")
            .part("file", Part::bytes(bytes).file_name(file_name));

        self.send(self.http.post(self.url("files")).multipart(form))
            .await
    }

    pub async fn delete_file(&self, file_id: &str) -> Result<(), OpenAiError> {
        let status: DeletionStatus = self
            .send(self.http.delete(self.url(&format!("files/{}", file_id))))
            .await?;
        Self::expect_deleted(status)
    }

    pub async fn create_assistant(
        &self,
        request: &CreateAssistantRequest,
    ) -> Result<Assistant, OpenAiError> {
        self.send(self.http.post(self.url("assistants")).json(request))
            .await
    }

    pub async fn delete_assistant(&self, assistant_id: &str) -> Result<(), OpenAiError> {
        let status: DeletionStatus = self
            .send(
                self.http
                    .delete(self.url(&format!("assistants/{}", assistant_id))),
            )
            .await?;
        Self::expect_deleted(status)
    }

    pub async fn create_thread(&self) -> Result<Thread, OpenAiError> {
        self.send(
            self.http
                .post(self.url("threads"))
                .json(&serde_json::json!({})),
        )
        .await
    }

    pub async fn create_message(
        &self,
        thread_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<ThreadMessage, OpenAiError> {
        self.send(
            self.http
                .post(self.url(&format!("threads/{}/messages", thread_id)))
                .json(request),
        )
        .await
    }

    pub async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, OpenAiError> {
        let request = CreateRunRequest {
            assistant_id: assistant_id.to_string(),
        };
        self.send(
            self.http
                .post(self.url(&format!("threads/{}/runs", thread_id)))
                .json(&request),
        )
        .await
    }

    pub async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, OpenAiError> {
        self.send(
            self.http
                .get(self.url(&format!("threads/{}/runs/{}", thread_id, run_id))),
        )
        .await
    }

    pub async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, OpenAiError> {
        self.send(
            self.http
                .post(self.url(&format!("threads/{}/runs/{}/cancel", thread_id, run_id))),
        )
        .await
    }

    pub async fn latest_message(
        &self,
        thread_id: &str,
    ) -> Result<Option<ThreadMessage>, OpenAiError> {
        let list: ListResponse<ThreadMessage> = self
            .send(
                self.http
                    .get(self.url(&format!("threads/{}/messages", thread_id)))
                    .query(&[("order", "desc"), ("limit", "1")]),
            )
            .await?;
        Ok(list.data.into_iter().next())
    }
}

#[async_trait]
impl AssistantApi for OpenAiClient {
    async fn upload_file(&self, path: &Path) -> Result<FileObject, OpenAiError> {
        OpenAiClient::upload_file(self, path).await
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), OpenAiError> {
        OpenAiClient::delete_file(self, file_id).await
    }

    async fn create_assistant(
        &self,
        request: &CreateAssistantRequest,
    ) -> Result<Assistant, OpenAiError> {
        OpenAiClient::create_assistant(self, request).await
    }

    async fn delete_assistant(&self, assistant_id: &str) -> Result<(), OpenAiError> {
        OpenAiClient::delete_assistant(self, assistant_id).await
    }

    async fn create_thread(&self) -> Result<Thread, OpenAiError> {
        OpenAiClient::create_thread(self).await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<ThreadMessage, OpenAiError> {
        OpenAiClient::create_message(self, thread_id, request).await
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, OpenAiError> {
        OpenAiClient::create_run(self, thread_id, assistant_id).await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, OpenAiError> {
        OpenAiClient::retrieve_run(self, thread_id, run_id).await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, OpenAiError> {
        OpenAiClient::cancel_run(self, thread_id, run_id).await
    }

    async fn latest_message(&self, thread_id: &str) -> Result<Option<ThreadMessage>, OpenAiError> {
        OpenAiClient::latest_message(self, thread_id).await
    }
}
