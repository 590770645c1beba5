//! Chunk translation: call the translation service for one chunk and
//! report the outcome as a [`ChunkResult`].
//!
//! [`translate_chunk`] never propagates an error; the runner decides from
//! the [`crate::config::ChunkFailurePolicy`] whether a failed chunk aborts
//! the job or is substituted. Retries are off by default; when
//! `max_retries > 0` the wait between attempts is
//! `retry_backoff_ms * 2^(attempt - 1)`.

use crate::config::PipelineConfig;
use crate::error::{ChunkError, TranslateError};
use crate::output::ChunkResult;
use crate::pipeline::chunk::TextChunk;
use crate::pipeline::cleanup::clean_translation;
use crate::prompts::{render_system_prompt, DEFAULT_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// One call to the translation service.
#[derive(Debug, Clone, Copy)]
pub struct TranslationRequest<'a> {
    pub text: &'a str,
    /// `auto` asks the service to detect the language.
    pub source_language: &'a str,
    pub target_language: &'a str,
}

/// A successful translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Translation {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A text translation service.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, request: &TranslationRequest<'_>) -> Result<Translation, TranslateError>;
}

/// Translator backed by a chat-completion LLM provider.
pub struct LlmTranslator {
    provider: Arc<dyn LLMProvider>,
    prompt_template: String,
    options: CompletionOptions,
}

impl LlmTranslator {
    /// Build from a provider, taking prompt and sampling settings from `config`.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &PipelineConfig) -> Self {
        Self {
            provider,
            prompt_template: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            options: build_options(config),
        }
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, request: &TranslationRequest<'_>) -> Result<Translation, TranslateError> {
        let system = render_system_prompt(
            &self.prompt_template,
            request.source_language,
            request.target_language,
        );
        let messages = vec![
            ChatMessage::system(system),
            ChatMessage::user(request.text.to_string()),
        ];

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| TranslateError::ServiceError {
                message: e.to_string(),
            })?;

        Ok(Translation {
            text: clean_translation(&response.content),
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
        })
    }
}

/// Build `CompletionOptions` from the pipeline config.
fn build_options(config: &PipelineConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Translate one chunk, retrying and timing out per `config`.
///
/// Whitespace-only chunks are passed through without a service call.
/// On failure the returned result carries an empty `translated` and the
/// last error.
pub async fn translate_chunk(
    translator: &dyn Translator,
    chunk: TextChunk<'_>,
    target_language: &str,
    config: &PipelineConfig,
) -> ChunkResult {
    let start = Instant::now();
    let mut result = ChunkResult {
        index: chunk.index,
        source_len: chunk.len(),
        translated: String::new(),
        input_tokens: 0,
        output_tokens: 0,
        duration_ms: 0,
        retries: 0,
        error: None,
    };

    if chunk.text.trim().is_empty() {
        result.translated = chunk.text.to_string();
        return result;
    }

    let request = TranslationRequest {
        text: chunk.text,
        source_language: &config.source_language,
        target_language,
    };

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "Chunk {}: retry {}/{} after {}ms",
                chunk.index, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        result.retries = attempt;
        match call_with_timeout(translator, &request, config.api_timeout_secs).await {
            Some(Ok(translation)) => {
                let duration = start.elapsed();
                debug!(
                    "Chunk {}: {} → {} bytes, {} input tokens, {} output tokens, {:?}",
                    chunk.index,
                    chunk.len(),
                    translation.text.len(),
                    translation.input_tokens,
                    translation.output_tokens,
                    duration
                );
                result.translated = translation.text;
                result.input_tokens = translation.input_tokens;
                result.output_tokens = translation.output_tokens;
                result.duration_ms = duration.as_millis() as u64;
                result.error = None;
                return result;
            }
            Some(Err(e)) => {
                warn!("Chunk {}: attempt {} failed — {}", chunk.index, attempt + 1, e);
                result.error = Some(ChunkError::TranslationFailed {
                    chunk: chunk.index,
                    retries: attempt,
                    detail: e.to_string(),
                });
            }
            None => {
                warn!(
                    "Chunk {}: attempt {} timed out after {}s",
                    chunk.index,
                    attempt + 1,
                    config.api_timeout_secs
                );
                result.error = Some(ChunkError::Timeout {
                    chunk: chunk.index,
                    secs: config.api_timeout_secs,
                });
            }
        }
    }

    result.duration_ms = start.elapsed().as_millis() as u64;
    result
}

/// Delay before retry `attempt` (1-based): `base * 2^(attempt - 1)`,
/// saturating at `u64::MAX`.
fn backoff_ms(base: u64, attempt: u32) -> u64 {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    base.saturating_mul(factor)
}

/// `None` when the call timed out. A zero timeout disables the limit.
async fn call_with_timeout(
    translator: &dyn Translator,
    request: &TranslationRequest<'_>,
    timeout_secs: u64,
) -> Option<Result<Translation, TranslateError>> {
    if timeout_secs == 0 {
        return Some(translator.translate(request).await);
    }
    timeout(Duration::from_secs(timeout_secs), translator.translate(request))
        .await
        .ok()
}
