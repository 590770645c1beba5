//! Output types produced by a translation run.

use crate::error::ChunkError;
use serde::{Deserialize, Serialize};

/// Outcome of translating a single chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResult {
    /// 0-based position of the chunk in the document.
    pub index: usize,
    /// UTF-8 byte length of the source chunk.
    pub source_len: usize,
    /// Text placed in the result for this chunk: the translation, or the
    /// substitute chosen by the failure policy when `error` is set.
    pub translated: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
    /// Retries spent before success or final failure.
    pub retries: u32,
    pub error: Option<ChunkError>,
}

impl ChunkResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate numbers for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationStats {
    pub page_count: usize,
    pub extracted_bytes: usize,
    pub total_chunks: usize,
    pub translated_chunks: usize,
    pub failed_chunks: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub extract_duration_ms: u64,
    pub translate_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// The immutable result of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationOutput {
    /// Chunk outputs concatenated in document order.
    pub translated_text: String,
    pub source_key: String,
    pub result_key: String,
    pub target_language: String,
    pub chunks: Vec<ChunkResult>,
    pub stats: TranslationStats,
}

impl TranslationOutput {
    /// Chunks that failed and were substituted.
    pub fn failed_chunks(&self) -> impl Iterator<Item = &ChunkResult> {
        self.chunks.iter().filter(|c| !c.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: usize, error: Option<ChunkError>) -> ChunkResult {
        ChunkResult {
            index,
            source_len: 10,
            translated: format!("t{index}"),
            input_tokens: 0,
            output_tokens: 0,
            duration_ms: 0,
            retries: 0,
            error,
        }
    }

    #[test]
    fn failed_chunks_iterates_only_errors() {
        let out = TranslationOutput {
            translated_text: "t0t1".into(),
            source_key: "a.pdf".into(),
            result_key: "a.txt".into(),
            target_language: "de".into(),
            chunks: vec![
                chunk(0, None),
                chunk(
                    1,
                    Some(ChunkError::Timeout { chunk: 1, secs: 1 }),
                ),
            ],
            stats: TranslationStats::default(),
        };
        let failed: Vec<usize> = out.failed_chunks().map(|c| c.index).collect();
        assert_eq!(failed, vec![1]);
    }
}
