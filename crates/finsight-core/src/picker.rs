//! Directory listing for choosing PDFs to upload
//!
//! Only directories and PDF files are ever listed, so anything picked from
//! the listing is already an upload candidate.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    Parent,
    Dir,
    Pdf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// List `dir`: parent first, then subdirectories, then PDFs, each sorted by name.
pub fn read_entries(dir: &Path) -> Result<Vec<PickerEntry>> {
    let mut dirs = Vec::new();
    let mut pdfs = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        // Follows symlinks
        let Ok(metadata) = fs::metadata(&path) else {
            continue;
        };

        if metadata.is_dir() {
            dirs.push(PickerEntry { name, path, kind: EntryKind::Dir });
        } else if metadata.is_file() && is_pdf(&path) {
            pdfs.push(PickerEntry { name, path, kind: EntryKind::Pdf });
        }
    }

    dirs.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    pdfs.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    let mut entries = Vec::with_capacity(dirs.len() + pdfs.len() + 1);
    if let Some(parent) = dir.parent() {
        entries.push(PickerEntry {
            name: "..".to_string(),
            path: parent.to_path_buf(),
            kind: EntryKind::Parent,
        });
    }
    entries.extend(dirs);
    entries.extend(pdfs);

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("report.pdf")));
        assert!(is_pdf(Path::new("/a/b/REPORT.PDF")));
        assert!(!is_pdf(Path::new("report.pdf.txt")));
        assert!(!is_pdf(Path::new("pdf")));
    }

    #[test]
    fn test_read_entries_filters_and_orders() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("zeta")).unwrap();
        fs::create_dir(root.join("Alpha")).unwrap();
        fs::create_dir(root.join(".hidden")).unwrap();
        fs::write(root.join("b.pdf"), b"%PDF").unwrap();
        fs::write(root.join("A.PDF"), b"%PDF").unwrap();
        fs::write(root.join("notes.txt"), b"x").unwrap();
        fs::write(root.join(".secret.pdf"), b"%PDF").unwrap();

        let entries = read_entries(root).unwrap();
        let listed: Vec<(&str, EntryKind)> =
            entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();

        assert_eq!(
            listed,
            vec![
                ("..", EntryKind::Parent),
                ("Alpha", EntryKind::Dir),
                ("zeta", EntryKind::Dir),
                ("A.PDF", EntryKind::Pdf),
                ("b.pdf", EntryKind::Pdf),
            ]
        );
        assert_eq!(entries[0].path, root.parent().unwrap());
    }

    #[test]
    fn test_read_entries_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_entries(&dir.path().join("nope")).is_err());
    }
}
