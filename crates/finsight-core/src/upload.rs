//! Upload widget state
//!
//! Holds the PDFs picked for upload, the in-flight flag, and the last
//! per-file results returned by the backend. The widget decides whether a
//! request may be issued at all; `run` performs it.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::client::BackendClient;
use crate::error::ClientError;
use crate::mode::UploadMode;
use crate::models::UploadResult;
use crate::picker::is_pdf;

pub const UPLOAD_FAILED: &str = "Upload failed";
pub const UPLOAD_SUCCEEDED: &str = "Upload successful";

/// A PDF on disk waiting to be uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

impl PendingFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        if !is_pdf(path) {
            return Err(anyhow!("{} is not a PDF", path.display()));
        }

        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(anyhow!("{} is not a file", path.display()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("{} has no file name", path.display()))?;

        Ok(Self {
            name,
            path: path.to_path_buf(),
            size: metadata.len(),
        })
    }
}

/// Files selected for upload, unique by file name
#[derive(Debug, Clone, Default)]
pub struct PendingFileSet {
    files: Vec<PendingFile>,
}

impl PendingFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every file whose name is not already pending. Returns how many were added.
    pub fn merge(&mut self, files: impl IntoIterator<Item = PendingFile>) -> usize {
        let mut added = 0;
        for file in files {
            if !self.contains(&file.name) {
                self.files.push(file);
                added += 1;
            }
        }
        added
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.name == name)
    }

    pub fn remove(&mut self, index: usize) -> Option<PendingFile> {
        if index < self.files.len() {
            Some(self.files.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn files(&self) -> &[PendingFile] {
        &self.files
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    fn keep_last(&mut self) {
        if self.files.len() > 1 {
            let last = self.files.len() - 1;
            self.files.drain(..last);
        }
    }
}

/// Everything one upload request needs
#[derive(Debug, Clone)]
pub struct UploadBatch {
    pub files: Vec<PendingFile>,
    pub mode: UploadMode,
}

#[derive(Debug, Default)]
pub struct UploadWidget {
    pub pending: PendingFileSet,
    pub uploading: bool,
    pub status: Option<String>,
    pub results: Vec<UploadResult>,
    mode: UploadMode,
}

impl UploadWidget {
    pub fn new(mode: UploadMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> UploadMode {
        self.mode
    }

    /// Switching to single-file mode keeps only the most recent selection
    pub fn set_mode(&mut self, mode: UploadMode) {
        if self.uploading {
            return;
        }
        self.mode = mode;
        if mode == UploadMode::Single {
            self.pending.keep_last();
        }
    }

    /// Add picked files. Returns how many entered the pending set.
    pub fn select(&mut self, files: Vec<PendingFile>) -> usize {
        if self.uploading || files.is_empty() {
            return 0;
        }
        self.status = None;

        match self.mode {
            UploadMode::Multi => self.pending.merge(files),
            UploadMode::Single => {
                self.pending.clear();
                self.pending.merge(files.into_iter().last())
            }
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<PendingFile> {
        if self.uploading {
            return None;
        }
        self.pending.remove(index)
    }

    pub fn can_submit(&self) -> bool {
        !self.pending.is_empty() && !self.uploading
    }

    /// Start an upload. `None` means no request may be issued.
    pub fn begin(&mut self) -> Option<UploadBatch> {
        if !self.can_submit() {
            return None;
        }
        self.uploading = true;
        self.status = None;

        Some(UploadBatch {
            files: self.pending.files().to_vec(),
            mode: self.mode,
        })
    }

    /// Apply the outcome of the request started by `begin`.
    pub fn finish(&mut self, outcome: std::result::Result<Vec<UploadResult>, ClientError>) {
        if !self.uploading {
            tracing::debug!("ignoring upload result with no upload in flight");
            return;
        }
        self.uploading = false;

        match outcome {
            Ok(results) => {
                tracing::info!(files = results.len(), "upload completed");
                self.results = results;
                self.pending.clear();
                self.status = Some(UPLOAD_SUCCEEDED.to_string());
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = ?e.kind(), "upload failed");
                self.status = Some(UPLOAD_FAILED.to_string());
            }
        }
    }
}

/// Send a batch to the backend
pub async fn run(
    client: BackendClient,
    batch: UploadBatch,
) -> std::result::Result<Vec<UploadResult>, ClientError> {
    client.upload(&batch.files, batch.mode).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> PendingFile {
        PendingFile {
            name: name.to_string(),
            path: PathBuf::from("/tmp").join(name),
            size: 1024,
        }
    }

    fn result(name: &str) -> UploadResult {
        UploadResult {
            filename: name.to_string(),
            message: "File processed successfully".to_string(),
            chunks_count: 12,
            processing_time: 0.5,
        }
    }

    #[test]
    fn test_merge_skips_existing_names() {
        let mut set = PendingFileSet::new();
        assert_eq!(set.merge(vec![pdf("a.pdf"), pdf("b.pdf")]), 2);
        assert_eq!(set.merge(vec![pdf("b.pdf"), pdf("c.pdf")]), 1);

        let names: Vec<&str> = set.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn test_merge_dedupes_within_one_selection() {
        let mut set = PendingFileSet::new();
        assert_eq!(set.merge(vec![pdf("a.pdf"), pdf("a.pdf")]), 1);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_begin_refuses_empty_set() {
        let mut widget = UploadWidget::new(UploadMode::Multi);
        assert!(!widget.can_submit());
        assert!(widget.begin().is_none());
        assert!(!widget.uploading);
    }

    #[test]
    fn test_begin_refuses_while_uploading() {
        let mut widget = UploadWidget::new(UploadMode::Multi);
        widget.select(vec![pdf("a.pdf")]);
        assert!(widget.begin().is_some());
        assert!(widget.begin().is_none());
    }

    #[test]
    fn test_success_clears_pending_and_stores_results() {
        let mut widget = UploadWidget::new(UploadMode::Multi);
        widget.select(vec![pdf("a.pdf"), pdf("b.pdf")]);

        let batch = widget.begin().unwrap();
        assert_eq!(batch.files.len(), 2);

        widget.finish(Ok(vec![result("a.pdf"), result("b.pdf")]));
        assert!(!widget.uploading);
        assert!(widget.pending.is_empty());
        assert_eq!(widget.results.len(), 2);
        assert_eq!(widget.status.as_deref(), Some(UPLOAD_SUCCEEDED));
    }

    #[test]
    fn test_http_failure_keeps_pending() {
        let mut widget = UploadWidget::new(UploadMode::Multi);
        widget.select(vec![pdf("a.pdf")]);
        widget.begin().unwrap();

        widget.finish(Err(ClientError::Status(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        )));
        assert_eq!(widget.status.as_deref(), Some("Upload failed"));
        assert_eq!(widget.pending.len(), 1);
        assert!(widget.can_submit());
    }

    #[test]
    fn test_file_read_failure_reads_as_upload_failed() {
        let mut widget = UploadWidget::new(UploadMode::Multi);
        widget.select(vec![pdf("gone.pdf")]);
        widget.begin().unwrap();

        widget.finish(Err(ClientError::File {
            path: PathBuf::from("/tmp/gone.pdf"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }));
        assert_eq!(widget.status.as_deref(), Some(UPLOAD_FAILED));
        assert_eq!(widget.pending.len(), 1);
    }

    #[test]
    fn test_late_result_is_ignored() {
        let mut widget = UploadWidget::new(UploadMode::Multi);
        widget.select(vec![pdf("a.pdf")]);
        widget.finish(Ok(vec![result("a.pdf")]));
        assert_eq!(widget.pending.len(), 1);
        assert!(widget.status.is_none());
    }

    #[test]
    fn test_single_mode_replaces_selection() {
        let mut widget = UploadWidget::new(UploadMode::Single);
        widget.select(vec![pdf("a.pdf")]);
        widget.select(vec![pdf("b.pdf"), pdf("c.pdf")]);

        assert_eq!(widget.pending.len(), 1);
        assert_eq!(widget.pending.files()[0].name, "c.pdf");
    }

    #[test]
    fn test_switching_to_single_keeps_latest() {
        let mut widget = UploadWidget::new(UploadMode::Multi);
        widget.select(vec![pdf("a.pdf"), pdf("b.pdf")]);
        widget.set_mode(UploadMode::Single);

        assert_eq!(widget.pending.len(), 1);
        assert_eq!(widget.pending.files()[0].name, "b.pdf");
    }

    #[test]
    fn test_selection_clears_status() {
        let mut widget = UploadWidget::new(UploadMode::Multi);
        widget.status = Some(UPLOAD_FAILED.to_string());
        widget.select(vec![pdf("a.pdf")]);
        assert!(widget.status.is_none());
    }

    #[test]
    fn test_pending_file_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Statement.PDF");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let file = PendingFile::from_path(&path).unwrap();
        assert_eq!(file.name, "Statement.PDF");
        assert_eq!(file.size, 8);

        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, b"hello").unwrap();
        assert!(PendingFile::from_path(&txt).is_err());
        assert!(PendingFile::from_path(&dir.path().join("missing.pdf")).is_err());
    }
}
