//! Request and response bodies for the backend API

use serde::{Deserialize, Serialize};

use crate::state::ChatMessage;

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub question: String,
    pub chat_history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<SourceCitation>,
    #[serde(default)]
    pub processing_time: Option<f64>,
}

/// A retrieved chunk the answer was grounded on
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceCitation {
    #[serde(default)]
    pub metadata: CitationMetadata,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl SourceCitation {
    pub fn document_name(&self) -> &str {
        self.metadata
            .source
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown Document")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CitationMetadata {
    #[serde(default)]
    pub source: Option<String>,
}

/// Outcome of processing one uploaded file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadResult {
    pub filename: String,
    pub message: String,
    pub chunks_count: u64,
    pub processing_time: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MultiUploadResponse {
    pub results: Vec<UploadResult>,
}

/// A document already indexed by the backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentInfo {
    pub filename: String,
    pub upload_date: String,
    pub chunks_count: u64,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocumentsResponse {
    pub documents: Vec<DocumentInfo>,
}

/// One indexed text chunk, as stored in the backend's vector store
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChunkInfo {
    #[serde(default)]
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Body of `GET /api/chunks`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChunksResponse {
    pub chunks: Vec<ChunkInfo>,
    pub total_count: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthResponse {
    pub message: String,
}
