//! Pipeline stages for PDF translation.
//!
//! Each submodule implements one step; [`crate::runner`] strings them
//! together.
//!
//! ## Data Flow
//!
//! ```text
//! storage ──▶ extract ──▶ chunk ──▶ translate ──▶ cleanup ──▶ storage
//!  (get)      (pdfium)   (≤5000B)    (LLM)        (fences)     (put)
//! ```
//!
//! 1. [`storage`]   — fetch the source object and persist the result
//! 2. [`extract`]   — stage the PDF in a temp dir and pull text per page;
//!    runs in `spawn_blocking` because pdfium is not async-safe
//! 3. [`chunk`]     — split text into pieces under the per-call limit
//! 4. [`translate`] — one translation call per chunk, optional retry/timeout
//! 5. [`cleanup`]   — undo chat-model formatting quirks in each answer

pub mod chunk;
pub mod cleanup;
pub mod extract;
pub mod storage;
pub mod translate;
