use std::path::{Path, PathBuf};

use ratatui::layout::Rect;
use ratatui::widgets::{ListState, TableState};
use tokio::task::JoinHandle;

use finsight_core::picker::{self, EntryKind, PickerEntry};
use finsight_core::{
    chat, upload, BackendClient, ChatMode, ChatResponse, ChatWidget, ChunksResponse, ClientError,
    Config, DocumentInfo, ErrorKind, PendingFile, UploadMode, UploadResult, UploadWidget,
};

type RequestTask<T> = JoinHandle<Result<T, ClientError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Upload,
    Chat,
    Documents,
}

impl Screen {
    pub const ALL: [Screen; 3] = [Screen::Upload, Screen::Chat, Screen::Documents];

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Upload => "Upload",
            Screen::Chat => "Chat",
            Screen::Documents => "Documents",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Screen::Upload => 0,
            Screen::Chat => 1,
            Screen::Documents => 2,
        }
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Unknown,
    Online,
    Offline,
}

/// PDF browser popup state
pub struct FilePicker {
    pub dir: PathBuf,
    pub entries: Vec<PickerEntry>,
    pub state: ListState,
    pub error: Option<String>,
}

impl FilePicker {
    pub fn open(dir: PathBuf) -> Self {
        let mut picker = Self {
            dir: PathBuf::new(),
            entries: Vec::new(),
            state: ListState::default(),
            error: None,
        };
        picker.load(dir);
        picker
    }

    pub fn load(&mut self, dir: PathBuf) {
        match picker::read_entries(&dir) {
            Ok(entries) => {
                self.entries = entries;
                self.error = None;
                self.dir = dir;
                // Skip the parent entry so the first child is preselected
                let first = self
                    .entries
                    .iter()
                    .position(|e| e.kind != EntryKind::Parent)
                    .unwrap_or(0);
                self.state.select(if self.entries.is_empty() { None } else { Some(first) });
            }
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "cannot list directory");
                self.error = Some(format!("Cannot open {}: {}", dir.display(), e));
            }
        }
    }

    pub fn selected(&self) -> Option<&PickerEntry> {
        self.state.selected().and_then(|i| self.entries.get(i))
    }

    pub fn nav_down(&mut self) {
        let len = self.entries.len();
        if len > 0 {
            let i = self.state.selected().unwrap_or(0);
            self.state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn nav_up(&mut self) {
        let i = self.state.selected().unwrap_or(0);
        self.state.select(Some(i.saturating_sub(1)));
    }

    pub fn parent(&mut self) {
        if let Some(parent) = self.dir.parent().map(Path::to_path_buf) {
            self.load(parent);
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub client: BackendClient,
    pub backend_status: BackendStatus,

    // Upload state
    pub upload: UploadWidget,
    pub pending_state: ListState,
    pub picker: Option<FilePicker>,
    pub notice: Option<String>, // feedback from file selection
    pub upload_task: Option<RequestTask<Vec<UploadResult>>>,

    // Chat state
    pub chat: ChatWidget,
    pub chat_scroll: u16,
    pub chat_follow: bool, // keep the newest turn in view
    pub chat_task: Option<RequestTask<ChatResponse>>,

    // Documents state
    pub documents: Vec<DocumentInfo>,
    pub documents_state: TableState,
    pub documents_status: Option<String>,
    pub documents_task: Option<RequestTask<Vec<DocumentInfo>>>,
    pub chunks_total: Option<u64>, // chunks across the whole index
    pub chunks_task: Option<RequestTask<ChunksResponse>>,

    pub health_task: Option<RequestTask<String>>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Transcript area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
}

impl App {
    pub fn new(client: BackendClient, upload_mode: UploadMode, chat_mode: ChatMode) -> Self {
        Self {
            should_quit: false,
            screen: Screen::Upload,
            input_mode: InputMode::Normal,
            client,
            backend_status: BackendStatus::Unknown,

            upload: UploadWidget::new(upload_mode),
            pending_state: ListState::default(),
            picker: None,
            notice: None,
            upload_task: None,

            chat: ChatWidget::new(chat_mode),
            chat_scroll: 0,
            chat_follow: true,
            chat_task: None,

            documents: Vec::new(),
            documents_state: TableState::default(),
            documents_status: None,
            documents_task: None,
            chunks_total: None,
            chunks_task: None,

            health_task: None,

            animation_frame: 0,

            chat_area: None,
        }
    }

    pub fn set_screen(&mut self, screen: Screen) {
        self.screen = screen;
        self.input_mode = InputMode::Normal;
        if screen == Screen::Documents && self.documents.is_empty() {
            self.refresh_documents();
        }
    }

    // Upload actions

    /// Add PDFs by path, as given on the command line or picked in the browser.
    pub fn select_paths(&mut self, paths: &[PathBuf]) -> usize {
        let mut files = Vec::new();
        let mut rejected = Vec::new();

        for path in paths {
            match PendingFile::from_path(path) {
                Ok(file) => files.push(file),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "file not selectable");
                    rejected.push(e.to_string());
                }
            }
        }

        let offered = files.len();
        let last_name = files.last().map(|f| f.name.clone());
        let added = self.upload.select(files);
        self.notice = if !rejected.is_empty() {
            Some(format!("Skipped: {}", rejected.join("; ")))
        } else if self.upload.mode() == UploadMode::Single && offered > 1 {
            last_name.map(|name| format!("Single-file mode: kept {}", name))
        } else if added < offered {
            Some(format!("{} already selected", offered - added))
        } else {
            None
        };

        if self.pending_state.selected().is_none() && !self.upload.pending.is_empty() {
            self.pending_state.select(Some(0));
        }
        added
    }

    pub fn start_upload(&mut self) {
        let Some(batch) = self.upload.begin() else {
            return;
        };
        self.notice = None;
        let client = self.client.clone();
        self.upload_task = Some(tokio::spawn(upload::run(client, batch)));
    }

    pub fn remove_selected_pending(&mut self) {
        if let Some(i) = self.pending_state.selected() {
            if self.upload.remove(i).is_some() {
                let len = self.upload.pending.len();
                if len == 0 {
                    self.pending_state.select(None);
                } else if i >= len {
                    self.pending_state.select(Some(len - 1));
                }
            }
        }
    }

    pub fn pending_nav_down(&mut self) {
        let len = self.upload.pending.len();
        if len > 0 {
            let i = self.pending_state.selected().unwrap_or(0);
            self.pending_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn pending_nav_up(&mut self) {
        let i = self.pending_state.selected().unwrap_or(0);
        self.pending_state.select(Some(i.saturating_sub(1)));
    }

    pub fn toggle_upload_mode(&mut self) {
        if self.upload.uploading {
            return;
        }
        self.upload.set_mode(self.upload.mode().toggle());
        if self.upload.pending.is_empty() {
            self.pending_state.select(None);
        } else {
            self.pending_state.select(Some(0));
        }
        self.save_modes();
    }

    // File picker actions

    pub fn open_picker(&mut self) {
        if self.upload.uploading {
            return;
        }
        let start = std::env::current_dir()
            .ok()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("/"));
        self.picker = Some(FilePicker::open(start));
    }

    /// Enter the selected directory or add the selected PDF
    pub fn picker_activate(&mut self) {
        let Some(entry) = self.picker.as_ref().and_then(|p| p.selected()).cloned() else {
            return;
        };

        match entry.kind {
            EntryKind::Parent | EntryKind::Dir => {
                if let Some(picker) = self.picker.as_mut() {
                    picker.load(entry.path);
                }
            }
            EntryKind::Pdf => {
                let added = self.select_paths(&[entry.path]);
                if added > 0 && self.notice.is_none() {
                    self.notice = Some(format!("Added {}", entry.name));
                }
                // Single-file mode holds one file, nothing more to pick
                if self.upload.mode() == UploadMode::Single {
                    self.picker = None;
                }
            }
        }
    }

    // Chat actions

    pub fn send_question(&mut self) {
        let Some(request) = self.chat.begin_send() else {
            return;
        };
        self.chat_follow = true;
        let client = self.client.clone();
        self.chat_task = Some(tokio::spawn(chat::run(client, request)));
    }

    pub fn new_conversation(&mut self) {
        if self.chat.is_sending() {
            return;
        }
        self.chat.reset();
        self.chat_scroll = 0;
        self.chat_follow = true;
    }

    pub fn toggle_chat_mode(&mut self) {
        self.chat.set_mode(self.chat.mode().toggle());
        self.save_modes();
    }

    pub fn scroll_chat_down(&mut self, amount: u16) {
        self.chat_follow = false;
        self.chat_scroll = self.chat_scroll.saturating_add(amount);
    }

    pub fn scroll_chat_up(&mut self, amount: u16) {
        self.chat_follow = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(amount);
    }

    // Documents actions

    pub fn refresh_documents(&mut self) {
        if self.documents_task.is_some() {
            return;
        }
        self.documents_status = Some("Loading documents...".to_string());
        let client = self.client.clone();
        self.documents_task = Some(tokio::spawn(async move { client.list_documents().await }));

        if self.chunks_task.is_none() {
            let client = self.client.clone();
            self.chunks_task = Some(tokio::spawn(async move { client.list_chunks().await }));
        }
    }

    pub fn documents_nav_down(&mut self) {
        let len = self.documents.len();
        if len > 0 {
            let i = self.documents_state.selected().unwrap_or(0);
            self.documents_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn documents_nav_up(&mut self) {
        let i = self.documents_state.selected().unwrap_or(0);
        self.documents_state.select(Some(i.saturating_sub(1)));
    }

    pub fn check_health(&mut self) {
        if self.health_task.is_some() {
            return;
        }
        let client = self.client.clone();
        self.health_task = Some(tokio::spawn(async move { client.health().await }));
    }

    /// Apply results of any request task that has completed
    pub async fn poll_tasks(&mut self) {
        if let Some(outcome) = take_finished(&mut self.upload_task).await {
            self.backend_status = match &outcome {
                Err(e) if e.kind() == ErrorKind::Transport => BackendStatus::Offline,
                _ => BackendStatus::Online,
            };
            self.upload.finish(outcome);
            if self.upload.pending.is_empty() {
                self.pending_state.select(None);
                // The index changed, refresh the list next time it is shown
                self.documents.clear();
                self.chunks_total = None;
            }
        }

        if let Some(outcome) = take_finished(&mut self.chat_task).await {
            if matches!(&outcome, Err(e) if e.kind() == ErrorKind::Transport) {
                self.backend_status = BackendStatus::Offline;
            }
            self.chat.finish(outcome);
            self.chat_follow = true;
        }

        if let Some(outcome) = take_finished(&mut self.documents_task).await {
            match outcome {
                Ok(documents) => {
                    self.documents_status = if documents.is_empty() {
                        Some("No documents uploaded yet".to_string())
                    } else {
                        None
                    };
                    self.documents_state
                        .select(if documents.is_empty() { None } else { Some(0) });
                    self.documents = documents;
                    self.backend_status = BackendStatus::Online;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not load documents");
                    self.documents_status = Some("Could not load documents".to_string());
                }
            }
        }

        if let Some(outcome) = take_finished(&mut self.chunks_task).await {
            self.chunks_total = match outcome {
                Ok(chunks) => Some(chunks.total_count),
                Err(e) => {
                    tracing::warn!(error = %e, "could not load chunk count");
                    None
                }
            };
        }

        if let Some(outcome) = take_finished(&mut self.health_task).await {
            self.backend_status = match outcome {
                Ok(message) => {
                    tracing::info!(%message, "backend reachable");
                    BackendStatus::Online
                }
                Err(e) => {
                    tracing::warn!(error = %e, url = self.client.base_url(), "backend unreachable");
                    BackendStatus::Offline
                }
            };
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.upload.uploading || self.chat.is_sending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    fn save_modes(&self) {
        if let Err(e) = Config::save_modes(self.upload.mode(), self.chat.mode()) {
            tracing::warn!(error = %e, "could not save config");
        }
    }
}

async fn take_finished<T>(slot: &mut Option<RequestTask<T>>) -> Option<Result<T, ClientError>> {
    if !slot.as_ref().is_some_and(|task| task.is_finished()) {
        return None;
    }
    let task = slot.take()?;
    Some(task.await.unwrap_or_else(|e| Err(ClientError::from(e))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsight_core::chat::CHAT_FALLBACK;
    use finsight_core::upload::UPLOAD_FAILED;
    use finsight_core::ChatMessage;
    use std::time::Duration;

    // Nothing listens on the discard port
    fn app() -> App {
        App::new(
            BackendClient::new("http://127.0.0.1:9"),
            UploadMode::Multi,
            ChatMode::MultiTurn,
        )
    }

    async fn settle(app: &mut App) {
        for _ in 0..500 {
            app.poll_tasks().await;
            if app.upload_task.is_none() && app.chat_task.is_none() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("request tasks did not finish");
    }

    #[test]
    fn test_screen_cycle() {
        assert_eq!(Screen::Upload.next(), Screen::Chat);
        assert_eq!(Screen::Documents.next(), Screen::Upload);
        assert_eq!(Screen::Upload.prev(), Screen::Documents);
    }

    #[tokio::test]
    async fn test_whitespace_question_spawns_nothing() {
        let mut app = app();
        app.chat.insert_char(' ');
        app.send_question();

        assert!(app.chat_task.is_none());
        assert!(app.chat.transcript.is_empty());
    }

    #[tokio::test]
    async fn test_failed_question_gets_fallback_turn() {
        let mut app = app();
        for c in "Operating margin?".chars() {
            app.chat.insert_char(c);
        }
        app.send_question();

        assert!(app.chat_task.is_some());
        assert!(app.chat.input.is_empty());
        assert_eq!(app.chat.transcript, vec![ChatMessage::user("Operating margin?")]);

        settle(&mut app).await;
        assert_eq!(app.chat.transcript.len(), 2);
        assert_eq!(app.chat.transcript[1], ChatMessage::assistant(CHAT_FALLBACK));
        assert!(!app.chat.is_sending());
    }

    #[tokio::test]
    async fn test_upload_without_files_spawns_nothing() {
        let mut app = app();
        app.start_upload();
        assert!(app.upload_task.is_none());
        assert!(!app.upload.uploading);
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q3.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let mut app = app();
        assert_eq!(app.select_paths(&[path.clone()]), 1);
        assert_eq!(app.select_paths(&[path]), 0);
        assert_eq!(app.notice.as_deref(), Some("1 already selected"));

        app.start_upload();
        assert!(app.upload.uploading);
        settle(&mut app).await;

        assert_eq!(app.upload.status.as_deref(), Some(UPLOAD_FAILED));
        assert_eq!(app.upload.pending.len(), 1);
        assert_eq!(app.backend_status, BackendStatus::Offline);
    }

    #[test]
    fn test_single_mode_reports_kept_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = ["q1.pdf", "q2.pdf", "q3.pdf"]
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                std::fs::write(&path, b"%PDF-1.4").unwrap();
                path
            })
            .collect();

        let mut app = App::new(
            BackendClient::new("http://127.0.0.1:9"),
            UploadMode::Single,
            ChatMode::MultiTurn,
        );
        assert_eq!(app.select_paths(&paths), 1);
        assert_eq!(app.upload.pending.files()[0].name, "q3.pdf");
        assert_eq!(app.notice.as_deref(), Some("Single-file mode: kept q3.pdf"));

        // One path in single mode needs no notice
        app.select_paths(&paths[..1]);
        assert!(app.notice.is_none());
    }

    #[tokio::test]
    async fn test_non_pdf_paths_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let mut app = app();
        assert_eq!(app.select_paths(&[path]), 0);
        assert!(app.upload.pending.is_empty());
        assert!(app.notice.as_deref().unwrap_or_default().starts_with("Skipped"));
    }

    #[test]
    fn test_picker_lists_pdfs_and_descends() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("2024")).unwrap();
        std::fs::write(dir.path().join("2024").join("q4.pdf"), b"%PDF").unwrap();

        let mut picker = FilePicker::open(dir.path().to_path_buf());
        assert_eq!(picker.selected().map(|e| e.name.as_str()), Some("2024"));

        let entry = picker.selected().cloned().unwrap();
        picker.load(entry.path);
        assert_eq!(picker.selected().map(|e| e.name.as_str()), Some("q4.pdf"));

        picker.parent();
        assert_eq!(picker.dir, dir.path());
    }
}
