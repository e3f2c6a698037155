//! Chat widget state
//!
//! One turn at a time: `begin_send` appends the user turn and hands back the
//! request, `finish` appends the assistant turn. The input is locked in
//! between.

use crate::client::BackendClient;
use crate::error::ClientError;
use crate::mode::ChatMode;
use crate::models::{ChatRequest, ChatResponse, SourceCitation};
use crate::state::ChatMessage;

pub const CHAT_FALLBACK: &str = "Sorry, something went wrong.";
pub const GREETING: &str = "Hello! I'm ready to answer your questions about the uploaded financial statement. What would you like to know?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    Sending,
}

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Answered,
    Failed,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Default)]
pub struct ChatWidget {
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars
    pub transcript: Vec<ChatMessage>,
    pub citations: Vec<SourceCitation>,
    pub last_processing_time: Option<f64>,
    state: TurnState,
    mode: ChatMode,
}

impl ChatWidget {
    pub fn new(mode: ChatMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_sending(&self) -> bool {
        self.state == TurnState::Sending
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ChatMode) {
        self.mode = mode;
    }

    pub fn can_send(&self) -> bool {
        self.state == TurnState::Idle && !self.input.trim().is_empty()
    }

    // Input editing. Every edit is refused while a turn is outstanding.

    pub fn insert_char(&mut self, c: char) {
        if self.is_sending() {
            return;
        }
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.is_sending() || self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.remove(byte_pos);
    }

    pub fn delete(&mut self) {
        if self.is_sending() {
            return;
        }
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input.chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    /// Start a turn. `None` means nothing was appended and no request may be issued.
    pub fn begin_send(&mut self) -> Option<ChatRequest> {
        if !self.can_send() {
            return None;
        }

        let question = std::mem::take(&mut self.input);
        self.cursor = 0;
        self.transcript.push(ChatMessage::user(question.clone()));
        self.citations.clear();
        self.last_processing_time = None;
        self.state = TurnState::Sending;

        let chat_history = match self.mode {
            ChatMode::SingleTurn => Vec::new(),
            ChatMode::MultiTurn => self.transcript.clone(),
        };

        Some(ChatRequest {
            question,
            chat_history,
        })
    }

    /// Apply the outcome of the request started by `begin_send`.
    pub fn finish(
        &mut self,
        outcome: Result<ChatResponse, ClientError>,
    ) -> Option<TurnOutcome> {
        if !self.is_sending() {
            tracing::debug!("ignoring chat response with no turn outstanding");
            return None;
        }
        self.state = TurnState::Idle;

        match outcome {
            Ok(response) => {
                tracing::info!(sources = response.sources.len(), "answer received");
                self.transcript.push(ChatMessage::assistant(response.answer));
                self.citations = response.sources;
                self.last_processing_time = response.processing_time;
                Some(TurnOutcome::Answered)
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = ?e.kind(), "chat request failed");
                self.transcript.push(ChatMessage::assistant(CHAT_FALLBACK));
                Some(TurnOutcome::Failed)
            }
        }
    }

    /// Start a new conversation
    pub fn reset(&mut self) {
        if self.is_sending() {
            return;
        }
        self.transcript.clear();
        self.citations.clear();
        self.last_processing_time = None;
    }
}

/// Send one question to the backend
pub async fn run(
    client: BackendClient,
    request: ChatRequest,
) -> Result<ChatResponse, ClientError> {
    client.chat(&request).await
}
