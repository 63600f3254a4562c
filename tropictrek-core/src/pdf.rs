//! Client-side record of itinerary PDFs reported by the backend.

use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::DownloadError;
use crate::preview::PdfEdit;
use crate::turn::TurnId;

static ITINERARY_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"TropicTrek_Itinerary_[A-Za-z0-9_.-]*?\.pdf").expect("itinerary file pattern is valid")
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PdfRecord {
    pub pdf_id: String,
    pub label: String,
    pub file_name: String,
    pub turn_id: TurnId,
    /// Text of the reply that announced the PDF
    pub text: String,
    /// Local edits made in the preview
    pub edited_text: Option<String>,
}

impl PdfRecord {
    pub fn new(pdf_id: &str, turn_id: TurnId, text: &str, ordinal: usize) -> Self {
        let (label, file_name) = match ITINERARY_FILE.find(text) {
            Some(m) => {
                let file_name = m.as_str().to_string();
                let label = file_name.trim_end_matches(".pdf").replace('_', " ");
                (label, file_name)
            }
            None => (
                format!("Itinerary {ordinal}"),
                format!("TropicTrek_Itinerary_{}.pdf", sanitize(pdf_id)),
            ),
        };

        Self {
            pdf_id: pdf_id.to_string(),
            label,
            file_name,
            turn_id,
            text: text.to_string(),
            edited_text: None,
        }
    }

    pub fn current_text(&self) -> &str {
        self.edited_text.as_deref().unwrap_or(&self.text)
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// PDFs in the order they were reported. Never invalidated; the backend is
/// authoritative for content.
#[derive(Clone, Debug, Default)]
pub struct PdfRegistry {
    records: Vec<PdfRecord>,
}

impl PdfRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a PDF. A repeated id keeps the first record.
    pub fn insert(&mut self, pdf_id: &str, turn_id: TurnId, text: &str) -> &PdfRecord {
        let index = match self.records.iter().position(|r| r.pdf_id == pdf_id) {
            Some(index) => index,
            None => {
                let ordinal = self.records.len() + 1;
                self.records.push(PdfRecord::new(pdf_id, turn_id, text, ordinal));
                self.records.len() - 1
            }
        };
        &self.records[index]
    }

    pub fn get(&self, pdf_id: &str) -> Option<&PdfRecord> {
        self.records.iter().find(|r| r.pdf_id == pdf_id)
    }

    /// 1-based lookup; `None` picks the most recent.
    pub fn by_number(&self, number: Option<usize>) -> Option<&PdfRecord> {
        match number {
            Some(n) => n.checked_sub(1).and_then(|i| self.records.get(i)),
            None => self.records.last(),
        }
    }

    /// 1-based position of a PDF.
    pub fn number_of(&self, pdf_id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.pdf_id == pdf_id).map(|i| i + 1)
    }

    pub fn apply_edit(&mut self, edit: &PdfEdit) -> bool {
        match self.records.iter_mut().find(|r| r.pdf_id == edit.pdf_id) {
            Some(record) => {
                record.edited_text = Some(edit.text.clone());
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PdfRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Candidate `n` for `file_name` in `dir`: "a.pdf", then "a (1).pdf", ...
fn candidate_path(dir: &Path, file_name: &str, n: usize) -> PathBuf {
    if n == 0 {
        return dir.join(file_name);
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => dir.join(format!("{stem} ({n}).{ext}")),
        None => dir.join(format!("{file_name} ({n})")),
    }
}

/// Write downloaded bytes into `dir` without overwriting existing files.
/// The file is created exclusively, so concurrent saves of the same name
/// land on different paths.
pub async fn save_pdf(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, DownloadError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| DownloadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    let mut n = 0;
    loop {
        let path = candidate_path(dir, file_name, n);
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                n += 1;
                continue;
            }
            Err(source) => return Err(DownloadError::Io { path, source }),
        };

        let written = match file.write_all(bytes).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        return match written {
            Ok(()) => Ok(path),
            Err(source) => Err(DownloadError::Io { path, source }),
        };
    }
}
