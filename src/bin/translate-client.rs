//! Interactive client for the translation web service.
//!
//! Resolves the service base URL (flag, environment, or TOML config file)
//! and hands stdin/stdout to the menu loop.

use anyhow::{Context, Result};
use clap::Parser;
use pdf_translate::client::{run_menu, validate_base_url, ApiClient, ClientConfig, DEFAULT_CONFIG_FILE};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"COMMANDS:
  0  end            leave the client
  1  users          list users
  2  jobs           list jobs
  3  upload         upload a PDF for a user
  4  download       print the results of a job
  5  reset          reset the database
  6  keywords       list keywords
  7  translate pdf  translate a local PDF and print the text

CONFIG FILE:
  [client]
  webservice = "https://abc123.execute-api.us-east-2.amazonaws.com/prod"

ENVIRONMENT VARIABLES:
  TRANSLATE_API_URL   Base URL of the web service (skips the config file)
  RUST_LOG            Log filter, e.g. debug
"#;

/// Menu-driven client for the PDF translation web service.
#[derive(Parser, Debug)]
#[command(
    name = "translate-client",
    version,
    about = "Menu-driven client for the PDF translation web service",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Base URL of the web service.
    #[arg(long, env = "TRANSLATE_API_URL")]
    base_url: Option<String>,

    /// TOML config file with a [client] webservice entry.
    #[arg(short, long, env = "TRANSLATE_CLIENT_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP timeout in seconds. Translating a long PDF takes a while.
    #[arg(long, env = "TRANSLATE_CLIENT_TIMEOUT", default_value_t = 300)]
    timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "** Welcome to the PDF translation client **")?;
    writeln!(out)?;

    let base_url = match cli.base_url {
        Some(ref url) => validate_base_url(url)?,
        None => {
            let path = match cli.config {
                Some(path) => path,
                None => ask_config_file(&mut input, &mut out)?,
            };
            ClientConfig::load(&path)
                .and_then(|cfg| cfg.base_url())
                .with_context(|| format!("Cannot use config file {}", path.display()))?
        }
    };

    let client = ApiClient::new(&base_url, cli.timeout)?;
    run_menu(&client, &mut input, &mut out)
        .await
        .context("Console I/O failed")?;
    Ok(())
}

/// Ask which config file to use; an empty answer picks the default.
fn ask_config_file<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<PathBuf> {
    writeln!(out, "Config file to use for this session?")?;
    writeln!(out, "Press ENTER to use default, or")?;
    writeln!(out, "enter config file name>")?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read from stdin")?;
    let name = line.trim();
    Ok(PathBuf::from(if name.is_empty() {
        DEFAULT_CONFIG_FILE
    } else {
        name
    }))
}
