//! Progress-callback trait for per-chunk pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through a document.
//!
//! # Example
//!
//! ```rust
//! use pdf_translate::{PipelineConfig, PipelineProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     translated: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_chunk_complete(&self, index: usize, total: usize, translated_len: usize) {
//!         self.translated.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("chunk {}/{} ({} bytes)", index + 1, total, translated_len);
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { translated: AtomicUsize::new(0) });
//! let config = PipelineConfig::builder()
//!     .progress_callback(cb as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it processes a document.
///
/// Implementations must be `Send + Sync`; with `concurrency > 1` chunk
/// events may arrive from several tasks. All methods default to no-ops.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once text has been extracted.
    ///
    /// # Arguments
    /// * `page_count`      — pages in the document
    /// * `extracted_bytes` — UTF-8 length of the extracted text
    fn on_text_extracted(&self, page_count: usize, extracted_bytes: usize) {
        let _ = (page_count, extracted_bytes);
    }

    /// Called once before the first chunk is translated.
    fn on_translation_start(&self, total_chunks: usize) {
        let _ = total_chunks;
    }

    /// Called just before a chunk is sent to the translator (0-based index).
    fn on_chunk_start(&self, index: usize, total_chunks: usize) {
        let _ = (index, total_chunks);
    }

    /// Called when a chunk is translated.
    fn on_chunk_complete(&self, index: usize, total_chunks: usize, translated_len: usize) {
        let _ = (index, total_chunks, translated_len);
    }

    /// Called when a chunk fails after all attempts.
    fn on_chunk_error(&self, index: usize, total_chunks: usize, error: &str) {
        let _ = (index, total_chunks, error);
    }

    /// Called after the result object has been written.
    fn on_result_persisted(&self, result_key: &str, bytes: usize) {
        let _ = (result_key, bytes);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        persisted: Mutex<Option<String>>,
    }

    impl PipelineProgressCallback for TrackingCallback {
        fn on_chunk_start(&self, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_chunk_complete(&self, _index: usize, _total: usize, _len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_chunk_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_result_persisted(&self, result_key: &str, _bytes: usize) {
            *self.persisted.lock().unwrap() = Some(result_key.to_string());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_text_extracted(2, 1024);
        cb.on_translation_start(3);
        cb.on_chunk_start(0, 3);
        cb.on_chunk_complete(0, 3, 42);
        cb.on_chunk_error(1, 3, "some error");
        cb.on_result_persisted("doc.txt", 42);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_chunk_start(0, 3);
        tracker.on_chunk_complete(0, 3, 100);
        tracker.on_chunk_start(1, 3);
        tracker.on_chunk_complete(1, 3, 200);
        tracker.on_chunk_start(2, 3);
        tracker.on_chunk_error(2, 3, "timeout");
        tracker.on_result_persisted("uploads/doc.txt", 300);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(
            tracker.persisted.lock().unwrap().as_deref(),
            Some("uploads/doc.txt")
        );
    }
}
