//! Error types for the pdf-translate library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`TranslateError`] — **Fatal**: the job cannot produce a result
//!   (object missing, not a PDF, provider not configured, a chunk failed
//!   under [`crate::config::ChunkFailurePolicy::Abort`]). Returned as
//!   `Err(TranslateError)` from [`crate::runner::TranslationPipeline::run`].
//!
//! * [`ChunkError`] — **Non-fatal**: a single chunk failed to translate.
//!   Stored inside [`crate::output::ChunkResult`] when the configured
//!   policy substitutes text for failed chunks, so the failure is always
//!   visible in the output rather than silently dropped.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-translate library.
#[derive(Debug, Error)]
pub enum TranslateError {
    // ── Storage errors ────────────────────────────────────────────────────
    /// The source object does not exist in the store.
    #[error("Object not found: '{key}'")]
    ObjectNotFound { key: String },

    /// The object store could not be reached or rejected the request.
    #[error("Storage request for '{key}' failed: {reason}")]
    StorageFailed { key: String, reason: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The object was fetched but is not a PDF.
    #[error("Object '{key}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { key: String, magic: Vec<u8> },

    /// pdfium could not open the document.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// Text extraction failed for a specific page.
    #[error("Text extraction failed for page {page}: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Translation errors ────────────────────────────────────────────────
    /// The configured LLM provider is not initialised (missing API key etc.).
    #[error("Translation provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The translation service returned an error for a call.
    #[error("Translation service error: {message}")]
    ServiceError { message: String },

    /// A chunk failed and the failure policy aborts the job.
    #[error("Chunk {index}/{total} failed to translate: {detail}")]
    ChunkFailed {
        index: usize,
        total: usize,
        detail: String,
    },

    /// Every chunk failed; substituting text for all of them is not a result.
    #[error("All {total} chunks failed to translate.\nFirst error: {first_error}")]
    AllChunksFailed { total: usize, first_error: String },

    // ── Request errors ────────────────────────────────────────────────────
    /// The storage event did not carry a usable object key.
    #[error("Invalid storage event: {0}")]
    InvalidEvent(String),

    /// A direct translate request could not be decoded.
    #[error("Invalid translate request: {0}")]
    InvalidRequest(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or argument validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not stage a file on local disk.
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single chunk.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum ChunkError {
    /// The translation call failed after all configured attempts.
    #[error("Chunk {chunk}: translation failed after {retries} retries: {detail}")]
    TranslationFailed {
        chunk: usize,
        retries: u32,
        detail: String,
    },

    /// The translation call exceeded the configured timeout.
    #[error("Chunk {chunk}: translation timed out after {secs}s")]
    Timeout { chunk: usize, secs: u64 },
}

impl ChunkError {
    /// 0-based index of the failed chunk.
    pub fn chunk(&self) -> usize {
        match self {
            ChunkError::TranslationFailed { chunk, .. } | ChunkError::Timeout { chunk, .. } => {
                *chunk
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_failed_display() {
        let e = TranslateError::ChunkFailed {
            index: 2,
            total: 3,
            detail: "quota exceeded".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("2/3"), "got: {msg}");
        assert!(msg.contains("quota exceeded"));
    }

    #[test]
    fn not_a_pdf_shows_magic() {
        let e = TranslateError::NotAPdf {
            key: "doc.pdf".into(),
            magic: b"PK\x03\x04".to_vec(),
        };
        assert!(e.to_string().contains("doc.pdf"));
    }

    #[test]
    fn chunk_error_reports_index() {
        let e = ChunkError::Timeout { chunk: 4, secs: 60 };
        assert_eq!(e.chunk(), 4);
        assert!(e.to_string().contains("60s"));

        let e = ChunkError::TranslationFailed {
            chunk: 1,
            retries: 0,
            detail: "boom".into(),
        };
        assert_eq!(e.chunk(), 1);
    }

    #[test]
    fn chunk_error_serialises() {
        let e = ChunkError::TranslationFailed {
            chunk: 0,
            retries: 2,
            detail: "503".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: ChunkError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn output_write_failed_has_source() {
        use std::error::Error as _;
        let e = TranslateError::OutputWriteFailed {
            path: PathBuf::from("/tmp/x"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(e.source().is_some());
    }
}
