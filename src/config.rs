//! Configuration types for the translation pipeline.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. Defaults reproduce the reference behaviour:
//! 5000-byte chunks, sequential translation, no retries, German as the
//! fallback target language, and abort on the first failed chunk.

use crate::error::TranslateError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Per-call size limit of the translation API, in bytes.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 5000;

/// Target language used when a request does not name one.
pub const DEFAULT_TARGET_LANGUAGE: &str = "de";

/// Source language code meaning "let the service detect it".
pub const AUTO_SOURCE_LANGUAGE: &str = "auto";

/// Configuration for a translation run.
///
/// # Example
/// ```rust
/// use pdf_translate::{ChunkFailurePolicy, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .max_chunk_size(4000)
///     .failure_policy(ChunkFailurePolicy::KeepSource)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_chunk_size, 4000);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Maximum chunk size in bytes. Default: 5000.
    ///
    /// Must not exceed the translation service's per-call limit.
    pub max_chunk_size: usize,

    /// Target language used when the caller supplies none. Default: `de`.
    pub default_target_language: String,

    /// Source language code passed to the translator. Default: `auto`.
    pub source_language: String,

    /// What to do when a chunk fails to translate. Default: [`ChunkFailurePolicy::Abort`].
    pub failure_policy: ChunkFailurePolicy,

    /// Number of chunk translations in flight at once. Default: 1.
    ///
    /// Output order is preserved for any value; 1 reproduces the strictly
    /// sequential reference behaviour.
    pub concurrency: usize,

    /// Retry attempts on a failed translation call. Default: 0.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call translation timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// LLM model identifier. If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the LLM. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per chunk. Default: 4096.
    pub max_tokens: usize,

    /// Custom system prompt. `{target}` and `{source}` are substituted.
    pub system_prompt: Option<String>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Content type of the persisted result object. Default: `text/plain`.
    pub result_content_type: String,

    /// Ask the store to make the result publicly readable. Default: true.
    pub public_read: bool,

    /// Optional per-chunk progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            default_target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            source_language: AUTO_SOURCE_LANGUAGE.to_string(),
            failure_policy: ChunkFailurePolicy::default(),
            concurrency: 1,
            max_retries: 0,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 4096,
            system_prompt: None,
            password: None,
            result_content_type: "text/plain".to_string(),
            public_read: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("max_chunk_size", &self.max_chunk_size)
            .field("default_target_language", &self.default_target_language)
            .field("source_language", &self.source_language)
            .field("failure_policy", &self.failure_policy)
            .field("concurrency", &self.concurrency)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("result_content_type", &self.result_content_type)
            .field("public_read", &self.public_read)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// The target language for a request, falling back to the default
    /// when the caller passed nothing or only whitespace.
    pub fn target_language_or_default<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested.map(str::trim) {
            Some(code) if !code.is_empty() => code,
            _ => &self.default_target_language,
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn max_chunk_size(mut self, bytes: usize) -> Self {
        self.config.max_chunk_size = bytes;
        self
    }

    pub fn default_target_language(mut self, code: impl Into<String>) -> Self {
        self.config.default_target_language = code.into();
        self
    }

    pub fn source_language(mut self, code: impl Into<String>) -> Self {
        self.config.source_language = code.into();
        self
    }

    pub fn failure_policy(mut self, policy: ChunkFailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn result_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.config.result_content_type = content_type.into();
        self
    }

    pub fn public_read(mut self, v: bool) -> Self {
        self.config.public_read = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, TranslateError> {
        let c = &self.config;
        // A UTF-8 code point is at most 4 bytes; smaller chunks cannot hold
        // arbitrary text.
        if c.max_chunk_size < 4 {
            return Err(TranslateError::InvalidConfig(format!(
                "Chunk size must be ≥ 4 bytes, got {}",
                c.max_chunk_size
            )));
        }
        if c.default_target_language.trim().is_empty() {
            return Err(TranslateError::InvalidConfig(
                "Default target language must not be empty".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(TranslateError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the pipeline reacts to a chunk that fails to translate.
///
/// | Policy | Result on chunk failure |
/// |--------|-------------------------|
/// | `Abort` | Job fails, nothing persisted (default) |
/// | `KeepSource` | Untranslated source text takes the chunk's place |
/// | `Placeholder(s)` | `s` takes the chunk's place |
///
/// Substituting policies still record the failure in the chunk result and
/// the run statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChunkFailurePolicy {
    #[default]
    Abort,
    KeepSource,
    Placeholder(String),
}

impl ChunkFailurePolicy {
    /// Text that stands in for a failed chunk, or `None` when the job must abort.
    pub fn substitute(&self, source: &str) -> Option<String> {
        match self {
            ChunkFailurePolicy::Abort => None,
            ChunkFailurePolicy::KeepSource => Some(source.to_string()),
            ChunkFailurePolicy::Placeholder(s) => Some(s.clone()),
        }
    }
}

impl std::str::FromStr for ChunkFailurePolicy {
    type Err = TranslateError;

    /// Parses `abort`, `keep-source`, or `placeholder:<text>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "abort" | "fail" => Ok(ChunkFailurePolicy::Abort),
            "keep-source" | "keep_source" | "source" => Ok(ChunkFailurePolicy::KeepSource),
            "placeholder" => Ok(ChunkFailurePolicy::Placeholder(String::new())),
            _ => match s.trim().split_once(':') {
                Some((kind, text)) if kind.eq_ignore_ascii_case("placeholder") => {
                    Ok(ChunkFailurePolicy::Placeholder(text.to_string()))
                }
                _ => Err(TranslateError::InvalidConfig(format!(
                    "Unknown chunk failure policy '{}' (expected abort, keep-source, placeholder:<text>)",
                    s
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behaviour() {
        let c = PipelineConfig::default();
        assert_eq!(c.max_chunk_size, 5000);
        assert_eq!(c.default_target_language, "de");
        assert_eq!(c.source_language, "auto");
        assert_eq!(c.failure_policy, ChunkFailurePolicy::Abort);
        assert_eq!(c.concurrency, 1);
        assert_eq!(c.max_retries, 0);
        assert!(c.public_read);
        assert!(c.password.is_none());
    }

    #[test]
    fn password_is_not_printed() {
        let c = PipelineConfig::builder().password("hunter2").build().unwrap();
        assert_eq!(c.password.as_deref(), Some("hunter2"));
        assert!(!format!("{c:?}").contains("hunter2"));
    }

    #[test]
    fn builder_rejects_tiny_chunks() {
        let err = PipelineConfig::builder().max_chunk_size(0).build().unwrap_err();
        assert!(matches!(err, TranslateError::InvalidConfig(_)));
        assert!(PipelineConfig::builder().max_chunk_size(3).build().is_err());
        assert!(PipelineConfig::builder().max_chunk_size(4).build().is_ok());
    }

    #[test]
    fn builder_rejects_blank_default_language() {
        assert!(PipelineConfig::builder()
            .default_target_language("  ")
            .build()
            .is_err());
    }

    #[test]
    fn builder_clamps_concurrency_and_temperature() {
        let c = PipelineConfig::builder()
            .concurrency(0)
            .temperature(5.0)
            .build()
            .unwrap();
        assert_eq!(c.concurrency, 1);
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn target_language_falls_back() {
        let c = PipelineConfig::default();
        assert_eq!(c.target_language_or_default(Some("es")), "es");
        assert_eq!(c.target_language_or_default(Some(" fr ")), "fr");
        assert_eq!(c.target_language_or_default(Some("")), "de");
        assert_eq!(c.target_language_or_default(None), "de");
    }

    #[test]
    fn policy_substitution() {
        assert_eq!(ChunkFailurePolicy::Abort.substitute("src"), None);
        assert_eq!(
            ChunkFailurePolicy::KeepSource.substitute("src"),
            Some("src".to_string())
        );
        assert_eq!(
            ChunkFailurePolicy::Placeholder("[?]".into()).substitute("src"),
            Some("[?]".to_string())
        );
    }

    #[test]
    fn policy_from_str() {
        assert_eq!(
            "abort".parse::<ChunkFailurePolicy>().unwrap(),
            ChunkFailurePolicy::Abort
        );
        assert_eq!(
            "Keep-Source".parse::<ChunkFailurePolicy>().unwrap(),
            ChunkFailurePolicy::KeepSource
        );
        assert_eq!(
            "placeholder:[untranslated]".parse::<ChunkFailurePolicy>().unwrap(),
            ChunkFailurePolicy::Placeholder("[untranslated]".into())
        );
        assert!("retry".parse::<ChunkFailurePolicy>().is_err());
    }
}
