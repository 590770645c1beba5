//! The translation run: fetch, extract, chunk, translate, assemble, persist.
//!
//! A [`TranslationPipeline`] owns the three seams it talks through
//! ([`ObjectStore`], [`TextExtractor`], [`Translator`]) and a
//! [`PipelineConfig`]. Each call to [`TranslationPipeline::run`] is
//! independent; nothing is retained between runs except what the store
//! persists.

use crate::config::PipelineConfig;
use crate::error::TranslateError;
use crate::output::{ChunkResult, TranslationOutput, TranslationStats};
use crate::pipeline::chunk::split_text;
use crate::pipeline::extract::{stage_pdf, PdfiumExtractor, TextExtractor};
use crate::pipeline::storage::{result_key_for, ObjectStore, PutOptions};
use crate::pipeline::translate::{translate_chunk, LlmTranslator, Translator};
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use std::pin::pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Model used when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Environment pair selecting provider and model for the run.
pub const PROVIDER_ENV: &str = "TRANSLATE_LLM_PROVIDER";
pub const MODEL_ENV: &str = "TRANSLATE_MODEL";

/// A configured translation pipeline.
pub struct TranslationPipeline {
    store: Arc<dyn ObjectStore>,
    extractor: Arc<dyn TextExtractor>,
    translator: Arc<dyn Translator>,
    config: PipelineConfig,
}

impl TranslationPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        extractor: Arc<dyn TextExtractor>,
        translator: Arc<dyn Translator>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            extractor,
            translator,
            config,
        }
    }

    /// Pipeline with the pdfium extractor and an LLM translator resolved
    /// from `config` and the environment.
    pub fn from_config(
        store: Arc<dyn ObjectStore>,
        config: PipelineConfig,
    ) -> Result<Self, TranslateError> {
        let provider = resolve_provider(&config)?;
        debug!(
            "Translation provider resolved (name: {:?}, model: {:?})",
            config.provider_name, config.model
        );
        let translator = Arc::new(LlmTranslator::new(provider, &config));
        Ok(Self::new(
            store,
            Arc::new(pdfium_extractor(&config)),
            translator,
            config,
        ))
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Translate the PDF stored under `source_key` and persist the result
    /// under its `.txt` key.
    ///
    /// `target_language` falls back to the configured default when `None`
    /// or blank.
    ///
    /// # Errors
    /// Any failing step ends the run. Under
    /// [`crate::config::ChunkFailurePolicy::Abort`] the first failed chunk
    /// returns [`TranslateError::ChunkFailed`] and nothing is persisted.
    pub async fn run(
        &self,
        source_key: &str,
        target_language: Option<&str>,
    ) -> Result<TranslationOutput, TranslateError> {
        let total_start = Instant::now();
        let target = self.config.target_language_or_default(target_language);
        info!("Starting translation of {} into '{}'", source_key, target);

        // ── Step 1: Fetch ────────────────────────────────────────────────
        let bytes = self.store.get(source_key).await?;
        debug!("Fetched {} ({} bytes)", source_key, bytes.len());

        // ── Step 2: Stage + extract ──────────────────────────────────────
        let extract_start = Instant::now();
        let staged = stage_pdf(source_key, &bytes).await?;
        drop(bytes);
        let extractor = Arc::clone(&self.extractor);
        let pdf_path = staged.path().to_path_buf();
        let extracted = tokio::task::spawn_blocking(move || extractor.extract(&pdf_path))
            .await
            .map_err(|e| TranslateError::Internal(format!("extraction task panicked: {e}")))??;
        drop(staged);

        let page_count = extracted.page_count();
        let text = extracted.into_text();
        let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
        info!(
            "Extracted {} bytes from {} pages in {}ms",
            text.len(),
            page_count,
            extract_duration_ms
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_text_extracted(page_count, text.len());
        }

        // ── Step 3: Chunk ────────────────────────────────────────────────
        let chunks = split_text(&text, self.config.max_chunk_size)?;
        let total = chunks.len();
        debug!(
            "Split into {} chunks of at most {} bytes",
            total, self.config.max_chunk_size
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_translation_start(total);
        }

        // ── Step 4: Translate in order ───────────────────────────────────
        let translate_start = Instant::now();
        let config = &self.config;
        let translator = self.translator.as_ref();
        let mut results = pin!(stream::iter(chunks.iter().copied().map(move |chunk| async move {
            if let Some(ref cb) = config.progress_callback {
                cb.on_chunk_start(chunk.index, total);
            }
            let result = translate_chunk(translator, chunk, target, config).await;
            if let Some(ref cb) = config.progress_callback {
                match &result.error {
                    None => cb.on_chunk_complete(chunk.index, total, result.translated.len()),
                    Some(e) => cb.on_chunk_error(chunk.index, total, &e.to_string()),
                }
            }
            result
        }))
        .buffered(config.concurrency));

        let mut chunk_results: Vec<ChunkResult> = Vec::with_capacity(total);
        while let Some(mut result) = results.next().await {
            if let Some(ref err) = result.error {
                match config.failure_policy.substitute(chunks[result.index].text) {
                    None => {
                        return Err(TranslateError::ChunkFailed {
                            index: result.index,
                            total,
                            detail: err.to_string(),
                        })
                    }
                    Some(substitute) => {
                        warn!(
                            "Chunk {}/{} failed, substituting {} bytes: {}",
                            result.index,
                            total,
                            substitute.len(),
                            err
                        );
                        result.translated = substitute;
                    }
                }
            }
            chunk_results.push(result);
        }
        let translate_duration_ms = translate_start.elapsed().as_millis() as u64;

        let failed = chunk_results.iter().filter(|r| !r.is_ok()).count();
        if total > 0 && failed == total {
            let first_error = chunk_results
                .iter()
                .find_map(|r| r.error.as_ref())
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(TranslateError::AllChunksFailed { total, first_error });
        }

        // ── Step 5: Assemble ─────────────────────────────────────────────
        let translated_text: String = chunk_results.iter().map(|r| r.translated.as_str()).collect();

        // ── Step 6: Persist ──────────────────────────────────────────────
        let result_key = result_key_for(source_key);
        let options = PutOptions {
            content_type: config.result_content_type.clone(),
            public_read: config.public_read,
        };
        let len = translated_text.len();
        self.store
            .put(&result_key, translated_text.clone().into_bytes(), &options)
            .await?;
        if let Some(ref cb) = config.progress_callback {
            cb.on_result_persisted(&result_key, len);
        }

        let stats = TranslationStats {
            page_count,
            extracted_bytes: text.len(),
            total_chunks: total,
            translated_chunks: total - failed,
            failed_chunks: failed,
            total_input_tokens: chunk_results.iter().map(|r| r.input_tokens).sum(),
            total_output_tokens: chunk_results.iter().map(|r| r.output_tokens).sum(),
            extract_duration_ms,
            translate_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        info!(
            "Translation complete: {}/{} chunks, {} → {} ({} bytes), {}ms total",
            stats.translated_chunks, total, source_key, result_key, len, stats.total_duration_ms
        );

        Ok(TranslationOutput {
            translated_text,
            source_key: source_key.to_string(),
            result_key,
            target_language: target.to_string(),
            chunks: chunk_results,
            stats,
        })
    }
}

/// Pdfium bound per `PDFIUM_LIB_PATH`, opening documents with the
/// configured password.
fn pdfium_extractor(config: &PipelineConfig) -> PdfiumExtractor {
    let extractor = PdfiumExtractor::from_env();
    match config.password {
        Some(ref password) => extractor.with_password(password.clone()),
        None => extractor,
    }
}

// ── Provider resolution ──────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, TranslateError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        TranslateError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. `config.provider`, used as-is
/// 2. `config.provider_name` with `config.model` (default [`DEFAULT_MODEL`])
/// 3. `TRANSLATE_LLM_PROVIDER` + `TRANSLATE_MODEL`, when both are set
/// 4. OpenAI when `OPENAI_API_KEY` is set
/// 5. whatever [`ProviderFactory::from_env`] detects
pub fn resolve_provider(config: &PipelineConfig) -> Result<Arc<dyn LLMProvider>, TranslateError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (std::env::var(PROVIDER_ENV), std::env::var(MODEL_ENV)) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| TranslateError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or {PROVIDER_ENV} + {MODEL_ENV}.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
