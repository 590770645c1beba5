//! Run the translation handler once, outside any serverless runtime.
//!
//! Takes a storage event (file or stdin), a bare object key, or a
//! translate request body, runs the pipeline against a local directory or
//! an HTTP bucket, and prints the gateway response JSON on stdout.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_translate::{
    handle_storage_event, handle_translate_body, ChunkFailurePolicy, HttpObjectStore,
    LocalObjectStore, ObjectStore, PipelineConfig, PipelineProgressCallback, ProgressCallback,
    StorageEvent, TranslationPipeline,
};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Fetching PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_text_extracted(&self, page_count: usize, extracted_bytes: usize) {
        self.bar.set_message(format!(
            "{page_count} pages, {extracted_bytes} bytes of text"
        ));
    }

    fn on_translation_start(&self, total_chunks: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} chunks  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        self.bar.set_length(total_chunks as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Translating");
    }

    fn on_chunk_complete(&self, index: usize, total: usize, translated_len: usize) {
        self.bar.println(format!(
            "  {} Chunk {:>3}/{:<3}  {}",
            green("✓"),
            index + 1,
            total,
            dim(&format!("{translated_len:>5} bytes")),
        ));
        self.bar.inc(1);
    }

    fn on_chunk_error(&self, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(['\u{2026}']).collect()
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Chunk {:>3}/{:<3}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_result_persisted(&self, result_key: &str, bytes: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        eprintln!(
            "{} {} bytes written to {}{}",
            green("✔"),
            bytes,
            result_key,
            if failed > 0 {
                red(&format!("  ({failed} chunks substituted)"))
            } else {
                String::new()
            }
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Storage event from a file, objects under ./bucket
  translate-handler event.json --store-dir ./bucket

  # Translate one key into Spanish
  translate-handler --key uploads/report.pdf --target-language es --store-dir ./bucket

  # Direct translate request body, HTTP bucket
  translate-handler --request request.json --bucket-url https://bucket.example.com/data

  # Keep untranslated text for failed chunks, retry twice
  translate-handler --key a.pdf --store-dir ./bucket --on-chunk-error keep-source --max-retries 2

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  TRANSLATE_LLM_PROVIDER  Provider, used together with TRANSLATE_MODEL
  TRANSLATE_MODEL         Model ID
  PDFIUM_LIB_PATH         Path to libpdfium; the system library is used otherwise
"#;

/// Translate a PDF from object storage and print the handler response.
#[derive(Parser, Debug)]
#[command(
    name = "translate-handler",
    version,
    about = "Translate a PDF from object storage and print the handler response",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Storage event JSON file; `-` reads stdin.
    #[arg(conflicts_with_all = ["key", "request"])]
    event: Option<PathBuf>,

    /// Object key to translate, instead of an event.
    #[arg(long)]
    key: Option<String>,

    /// Translate request body JSON file ({filename, data, language_code}).
    #[arg(long, conflicts_with = "key")]
    request: Option<PathBuf>,

    /// Target language code used with --key.
    #[arg(long, short = 't')]
    target_language: Option<String>,

    /// Directory acting as the bucket.
    #[arg(long, env = "TRANSLATE_STORE_DIR", conflicts_with = "bucket_url")]
    store_dir: Option<PathBuf>,

    /// Base URL of an HTTP bucket.
    #[arg(long, env = "TRANSLATE_BUCKET_URL")]
    bucket_url: Option<String>,

    /// Bearer token for the HTTP bucket.
    #[arg(long, env = "TRANSLATE_BUCKET_TOKEN", hide_env_values = true)]
    bucket_token: Option<String>,

    /// HTTP bucket timeout in seconds.
    #[arg(long, env = "TRANSLATE_STORAGE_TIMEOUT", default_value_t = 120)]
    storage_timeout: u64,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "TRANSLATE_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID.
    #[arg(long, env = "TRANSLATE_MODEL")]
    model: Option<String>,

    /// Target language when the request names none.
    #[arg(long, env = "TRANSLATE_DEFAULT_LANGUAGE", default_value = "de")]
    default_language: String,

    /// Maximum chunk size in bytes.
    #[arg(long, env = "TRANSLATE_CHUNK_SIZE", default_value_t = 5000)]
    chunk_size: usize,

    /// Failed chunk handling: abort, keep-source, placeholder:<text>.
    #[arg(long, env = "TRANSLATE_ON_CHUNK_ERROR", default_value = "abort")]
    on_chunk_error: String,

    /// Retries per chunk on translation failure.
    #[arg(long, env = "TRANSLATE_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Chunks translated at once; output order is kept.
    #[arg(short, long, env = "TRANSLATE_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Per-chunk translation timeout in seconds (0 disables).
    #[arg(long, env = "TRANSLATE_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "TRANSLATE_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "TRANSLATE_PDF_PASSWORD")]
    password: Option<String>,

    /// Disable progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build pipeline ───────────────────────────────────────────────────
    let store = build_store(&cli)?;
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress).await?;
    let pipeline =
        TranslationPipeline::from_config(store, config).context("Failed to set up translator")?;

    // ── Dispatch ─────────────────────────────────────────────────────────
    let response = if let Some(ref path) = cli.request {
        let body = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read request from {}", path.display()))?;
        handle_translate_body(&pipeline, &body).await
    } else {
        let event = match (&cli.event, &cli.key) {
            (_, Some(key)) => serde_json::to_value(StorageEvent::for_key(
                key,
                cli.target_language.clone(),
            ))?,
            (Some(path), None) => read_event(path)?,
            (None, None) => anyhow::bail!("Give an event file, --key, or --request"),
        };
        handle_storage_event(&pipeline, &event).await
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&response.to_gateway_json())
            .context("Failed to serialise response")?
    );

    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn build_store(cli: &Cli) -> Result<Arc<dyn ObjectStore>> {
    match (&cli.store_dir, &cli.bucket_url) {
        (Some(dir), _) => Ok(Arc::new(LocalObjectStore::new(dir))),
        (None, Some(url)) => {
            let mut store = HttpObjectStore::new(url, cli.storage_timeout)?;
            if let Some(ref token) = cli.bucket_token {
                store = store.with_token(token);
            }
            Ok(Arc::new(store))
        }
        (None, None) => anyhow::bail!("Give --store-dir or --bucket-url"),
    }
}

fn read_event(path: &Path) -> Result<serde_json::Value> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event from {}", path.display()))?
    };
    serde_json::from_str(&text).context("Event is not valid JSON")
}

/// Map CLI args to `PipelineConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let policy: ChunkFailurePolicy = cli.on_chunk_error.parse()?;

    let mut builder = PipelineConfig::builder()
        .max_chunk_size(cli.chunk_size)
        .default_target_language(cli.default_language.clone())
        .failure_policy(policy)
        .max_retries(cli.max_retries)
        .concurrency(cli.concurrency)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
