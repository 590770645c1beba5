//! # pdf-translate
//!
//! Translate PDF documents held in object storage, and talk to the
//! translation web service from a terminal.
//!
//! ## Pipeline Overview
//!
//! ```text
//! storage event / translate request
//!  │
//!  ├─ 1. Fetch     object bytes from the store
//!  ├─ 2. Extract   page text via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Chunk     ≤ 5000-byte UTF-8 pieces
//!  ├─ 4. Translate one call per chunk, in document order
//!  ├─ 5. Assemble  concatenate chunk outputs
//!  └─ 6. Persist   `<key>.txt` back to the store
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_translate::{LocalObjectStore, PipelineConfig, TranslationPipeline};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let store = Arc::new(LocalObjectStore::new("bucket"));
//!     let pipeline = TranslationPipeline::from_config(store, PipelineConfig::default())?;
//!     let output = pipeline.run("uploads/report.pdf", Some("es")).await?;
//!     println!("{} → {}", output.source_key, output.result_key);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `translate-client` and `translate-handler` binaries |
//!
//! ```toml
//! pdf-translate = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod runner;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ChunkFailurePolicy, PipelineConfig, PipelineConfigBuilder};
pub use error::{ChunkError, TranslateError};
pub use handler::{
    handle_storage_event, handle_translate_body, handle_translate_request, HandlerResponse,
    StorageEvent,
};
pub use output::{ChunkResult, TranslationOutput, TranslationStats};
pub use pipeline::chunk::{split_bytes, split_text, TextChunk};
pub use pipeline::extract::{ExtractedText, PdfiumExtractor, TextExtractor};
pub use pipeline::storage::{
    result_key_for, upload_key_for, HttpObjectStore, LocalObjectStore, ObjectStore, PutOptions,
};
pub use pipeline::translate::{LlmTranslator, Translation, TranslationRequest, Translator};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use runner::{resolve_provider, TranslationPipeline};
