use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;

use crate::error::{ClientError, Result};
use crate::mode::UploadMode;
use crate::models::{
    ChatRequest, ChatResponse, ChunksResponse, DocumentInfo, DocumentsResponse, HealthResponse,
    MultiUploadResponse, UploadResult,
};
use crate::upload::PendingFile;

/// HTTP client for the document Q&A backend.
///
/// No timeout is configured; a hung backend keeps the request pending.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload PDFs in one multipart request.
    pub async fn upload(&self, files: &[PendingFile], mode: UploadMode) -> Result<Vec<UploadResult>> {
        let url = format!("{}/api/upload", self.base_url);

        let mut form = multipart::Form::new();
        for file in files {
            let bytes = tokio::fs::read(&file.path)
                .await
                .map_err(|source| ClientError::File {
                    path: file.path.clone(),
                    source,
                })?;

            let part = multipart::Part::bytes(bytes)
                .file_name(file.name.clone())
                .mime_str("application/pdf")?;
            form = form.part(mode.field_name(), part);
        }

        tracing::info!(files = files.len(), mode = mode.as_str(), "uploading");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await?;
        let response = check_status(response)?;

        match mode {
            UploadMode::Multi => {
                let body: MultiUploadResponse = response.json().await?;
                Ok(body.results)
            }
            UploadMode::Single => {
                let result: UploadResult = response.json().await?;
                Ok(vec![result])
            }
        }
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/api/chat", self.base_url);

        tracing::info!(history = request.chat_history.len(), "asking question");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await?;

        decode(check_status(response)?).await
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
        let url = format!("{}/api/documents", self.base_url);

        let response = self.client.get(&url).send().await?;
        let documents: DocumentsResponse = decode(check_status(response)?).await?;
        Ok(documents.documents)
    }

    /// Every chunk in the index, with the backend's total count
    pub async fn list_chunks(&self) -> Result<ChunksResponse> {
        let url = format!("{}/api/chunks", self.base_url);

        let response = self.client.get(&url).send().await?;
        decode(check_status(response)?).await
    }

    /// Backend liveness message from `GET /`
    pub async fn health(&self) -> Result<String> {
        let url = format!("{}/", self.base_url);

        let response = self.client.get(&url).send().await?;
        let health: HealthResponse = decode(check_status(response)?).await?;
        Ok(health.message)
    }
}

// Non-2xx responses are failures; the body is never read.
fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(%status, url = %response.url(), "backend returned an error status");
        return Err(ClientError::Status(status));
    }
    Ok(response)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BackendClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
