//! Input validation: turn a user-supplied path into a checked [`PdfInput`].
//!
//! We check existence, read permission and the `%PDF` magic bytes up front
//! so callers get a meaningful error instead of a pdfium failure, and so a
//! remote worker is never sent something that is not a PDF.

use crate::error::Pdf2DeckError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stem used when the input name gives nothing usable.
pub const FALLBACK_DECK_STEM: &str = "converted";

/// A local PDF that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInput {
    pub path: PathBuf,
}

impl PdfInput {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name as sent to a remote worker.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{FALLBACK_DECK_STEM}.pdf"))
    }

    /// Output deck name with the given extension, e.g. `report.json`.
    pub fn deck_file_name(&self, extension: &str) -> String {
        format!("{}.{}", deck_stem(&self.file_name()), extension)
    }

    /// Read the whole file.
    pub async fn read_bytes(&self) -> Result<Vec<u8>, Pdf2DeckError> {
        tokio::fs::read(&self.path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Pdf2DeckError::FileNotFound {
                path: self.path.clone(),
            },
            std::io::ErrorKind::PermissionDenied => Pdf2DeckError::PermissionDenied {
                path: self.path.clone(),
            },
            _ => Pdf2DeckError::InvalidInput {
                input: self.path.display().to_string(),
                reason: e.to_string(),
            },
        })
    }
}

/// Validate a local PDF path.
pub fn resolve_input(input: &str) -> Result<PdfInput, Pdf2DeckError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Pdf2DeckError::InvalidInput {
            input: input.to_string(),
            reason: "no file given".into(),
        });
    }
    let path = PathBuf::from(trimmed);

    if !path.exists() {
        return Err(Pdf2DeckError::FileNotFound { path });
    }
    if path.is_dir() {
        return Err(Pdf2DeckError::InvalidInput {
            input: trimmed.to_string(),
            reason: "is a directory, expected a PDF file".into(),
        });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2DeckError::PermissionDenied { path });
        }
        Err(_) => return Err(Pdf2DeckError::FileNotFound { path }),
    };

    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_err() {
        return Err(Pdf2DeckError::InvalidInput {
            input: trimmed.to_string(),
            reason: "file is empty or truncated".into(),
        });
    }
    if &magic != b"%PDF" {
        return Err(Pdf2DeckError::NotAPdf { path, magic });
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(PdfInput { path })
}

/// Strip a trailing `.pdf` (any case) from a file name.
pub fn deck_stem(file_name: &str) -> String {
    let name = file_name.trim();
    let stem = match name.len().checked_sub(4) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".pdf") => &name[..cut],
        _ => name,
    };
    let stem = stem.trim();
    if stem.is_empty() {
        FALLBACK_DECK_STEM.to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::File::create(&path).unwrap().write_all(bytes).unwrap();
        path
    }

    #[test]
    fn accepts_pdf_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "Quarterly Report.PDF", b"%PDF-1.7\n");
        let input = resolve_input(path.to_str().unwrap()).unwrap();
        assert_eq!(input.file_name(), "Quarterly Report.PDF");
        assert_eq!(input.deck_file_name("pptx"), "Quarterly Report.pptx");
    }

    #[test]
    fn rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "notes.pdf", b"PK\x03\x04rest");
        let err = resolve_input(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Pdf2DeckError::NotAPdf { magic, .. } if &magic == b"PK\x03\x04"));
    }

    #[test]
    fn rejects_empty_missing_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let empty = write_temp(&dir, "empty.pdf", b"");
        assert!(matches!(
            resolve_input(empty.to_str().unwrap()),
            Err(Pdf2DeckError::InvalidInput { .. })
        ));
        assert!(matches!(
            resolve_input(dir.path().join("missing.pdf").to_str().unwrap()),
            Err(Pdf2DeckError::FileNotFound { .. })
        ));
        assert!(matches!(
            resolve_input(dir.path().to_str().unwrap()),
            Err(Pdf2DeckError::InvalidInput { .. })
        ));
        assert!(matches!(resolve_input("  "), Err(Pdf2DeckError::InvalidInput { .. })));
    }

    #[test]
    fn deck_stem_rules() {
        assert_eq!(deck_stem("slides.pdf"), "slides");
        assert_eq!(deck_stem("slides.Pdf"), "slides");
        assert_eq!(deck_stem("archive.pdf.zip"), "archive.pdf.zip");
        assert_eq!(deck_stem(".pdf"), "converted");
        assert_eq!(deck_stem(""), "converted");
        assert_eq!(deck_stem("é.pdf"), "é");
    }

    #[tokio::test]
    async fn reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "a.pdf", b"%PDF-1.4 body");
        let input = resolve_input(path.to_str().unwrap()).unwrap();
        assert_eq!(input.read_bytes().await.unwrap(), b"%PDF-1.4 body");
    }
}
