//! Text extraction for source regulation documents.
//!
//! The corpus is PDF regulations plus the occasional plain-text supplement.
//! Extraction failures are non-fatal to an ingestion batch; the caller logs
//! and skips the document.

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("PDF extraction failed for {path}: {message}")]
    Pdf { path: String, message: String },
}

/// Extract plain UTF-8 text from a source document.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => pdf_extract::extract_text(path).map_err(|e| ExtractError::Pdf {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
        "txt" | "md" => std::fs::read_to_string(path).map_err(|e| ExtractError::Io {
            path: path.display().to_string(),
            source: e,
        }),
        other => Err(ExtractError::Unsupported(other.to_string())),
    }
}

/// Whether this file should be picked up by an ingestion scan.
pub fn is_source_document(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("pdf") | Some("txt") | Some("md")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn plain_text_is_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jtr_excerpt.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"Lodging is reimbursed up to the locality rate.")
            .unwrap();

        let text = extract_text(&path).unwrap();
        assert_eq!(text, "Lodging is reimbursed up to the locality rate.");
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let err = extract_text(Path::new("slides.pptx")).unwrap_err();
        assert!(matches!(err, ExtractError::Unsupported(_)));
    }

    #[test]
    fn corrupt_pdf_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();
        let err = extract_text(&path).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf { .. }));
    }

    #[test]
    fn source_document_filter() {
        assert!(is_source_document(Path::new("jtr.pdf")));
        assert!(is_source_document(Path::new("notes.txt")));
        assert!(!is_source_document(Path::new("archive.zip")));
        assert!(!is_source_document(Path::new("README")));
    }
}
