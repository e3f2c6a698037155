pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod mode;
pub mod models;
pub mod picker;
pub mod state;
pub mod upload;

// Re-export main types for convenience
pub use chat::{ChatWidget, TurnOutcome, TurnState};
pub use client::BackendClient;
pub use config::Config;
pub use error::{ClientError, ErrorKind};
pub use mode::{ChatMode, UploadMode};
pub use models::{
    ChatRequest, ChatResponse, ChunkInfo, ChunksResponse, DocumentInfo, SourceCitation,
    UploadResult,
};
pub use picker::{EntryKind, PickerEntry};
pub use state::{ChatMessage, ChatRole};
pub use upload::{PendingFile, PendingFileSet, UploadBatch, UploadWidget};
