//! Text extraction: stage the fetched PDF on disk and pull its text out
//! page by page via pdfium.
//!
//! pdfium wraps a C++ library with thread-local state, so extraction is a
//! blocking operation; the runner calls [`TextExtractor::extract`] inside
//! `tokio::task::spawn_blocking`.

use crate::error::TranslateError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Environment variable naming an explicit pdfium library file.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Text pulled from a document, one entry per page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pub pages: Vec<String>,
}

impl ExtractedText {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Join pages into one string, each page followed by a newline.
    pub fn into_text(self) -> String {
        let capacity = self.pages.iter().map(|p| p.len() + 1).sum();
        self.pages
            .into_iter()
            .fold(String::with_capacity(capacity), |mut acc, page| {
                acc.push_str(&page);
                acc.push('\n');
                acc
            })
    }
}

/// Something that can read the text out of a PDF on disk.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, pdf_path: &Path) -> Result<ExtractedText, TranslateError>;
}

/// A fetched PDF written to a private temp directory.
///
/// The directory is removed when this value is dropped.
pub struct StagedPdf {
    path: PathBuf,
    _temp_dir: TempDir,
}

impl StagedPdf {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Reject anything that does not start with the `%PDF` magic bytes.
pub fn check_pdf_magic(key: &str, bytes: &[u8]) -> Result<(), TranslateError> {
    if bytes.starts_with(b"%PDF") {
        Ok(())
    } else {
        Err(TranslateError::NotAPdf {
            key: key.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        })
    }
}

/// Validate and write `bytes` to a temp file pdfium can open.
pub async fn stage_pdf(key: &str, bytes: &[u8]) -> Result<StagedPdf, TranslateError> {
    check_pdf_magic(key, bytes)?;

    let temp_dir = TempDir::new().map_err(|e| TranslateError::Internal(format!("tempdir: {e}")))?;
    let path = temp_dir.path().join("source.pdf");
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| TranslateError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    debug!("Staged {} ({} bytes) at {}", key, bytes.len(), path.display());
    Ok(StagedPdf {
        path,
        _temp_dir: temp_dir,
    })
}

/// pdfium-backed extractor.
///
/// Binds to the library at `library_path` when set, otherwise to the
/// platform's system library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfiumExtractor {
    library_path: Option<PathBuf>,
    password: Option<String>,
}

impl PdfiumExtractor {
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self {
            library_path,
            password: None,
        }
    }

    /// Honour `PDFIUM_LIB_PATH` when it is set and non-empty.
    pub fn from_env() -> Self {
        let library_path = std::env::var(PDFIUM_LIB_PATH_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        Self::new(library_path)
    }

    /// User password for encrypted documents.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    fn bind(&self) -> Result<Pdfium, TranslateError> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| TranslateError::PdfiumBindingFailed(e.to_string()))?;
        Ok(Pdfium::new(bindings))
    }
}

impl TextExtractor for PdfiumExtractor {
    fn extract(&self, pdf_path: &Path) -> Result<ExtractedText, TranslateError> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_file(pdf_path, self.password.as_deref())
            .map_err(|e| TranslateError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        let mut extracted = Vec::with_capacity(pages.len() as usize);

        for (idx, page) in pages.iter().enumerate() {
            let text = page.text().map_err(|e| TranslateError::ExtractionFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;
            let content = text.all();
            debug!("Page {}: {} bytes of text", idx + 1, content.len());
            extracted.push(content);
        }

        info!("Extracted text from {} pages", extracted.len());
        Ok(ExtractedText { pages: extracted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_accepts_pdf_header() {
        assert!(check_pdf_magic("a.pdf", b"%PDF-1.7\n...").is_ok());
    }

    #[test]
    fn magic_rejects_other_content() {
        match check_pdf_magic("a.pdf", b"PK\x03\x04rest") {
            Err(TranslateError::NotAPdf { key, magic }) => {
                assert_eq!(key, "a.pdf");
                assert_eq!(magic, b"PK\x03\x04");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(check_pdf_magic("empty.pdf", b"").is_err());
        assert!(check_pdf_magic("short.pdf", b"%P").is_err());
    }

    #[test]
    fn pages_are_newline_terminated() {
        let text = ExtractedText {
            pages: vec!["one".into(), "".into(), "three".into()],
        };
        assert_eq!(text.page_count(), 3);
        assert_eq!(text.into_text(), "one\n\nthree\n");
        assert_eq!(ExtractedText::default().into_text(), "");
    }

    #[tokio::test]
    async fn staged_pdf_is_removed_on_drop() {
        let staged = stage_pdf("doc.pdf", b"%PDF-1.4 fake").await.unwrap();
        let path = staged.path().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 fake");
        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn staging_rejects_non_pdf() {
        let err = stage_pdf("doc.pdf", b"hello").await.err().unwrap();
        assert!(matches!(err, TranslateError::NotAPdf { .. }));
    }

    #[test]
    fn missing_library_is_a_binding_error() {
        let extractor =
            PdfiumExtractor::new(Some(PathBuf::from("/nonexistent/dir/libpdfium.so")));
        let err = extractor
            .extract(Path::new("/nonexistent/doc.pdf"))
            .unwrap_err();
        assert!(matches!(err, TranslateError::PdfiumBindingFailed(_)), "{err:?}");
    }
}
