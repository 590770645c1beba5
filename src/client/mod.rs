//! Menu-driven client for the translation web service.
//!
//! * [`config`] — base URL from a TOML file or the command line
//! * [`http`]   — one typed method per API endpoint
//! * [`menu`]   — numbered-command loop over any reader/writer pair

pub mod config;
pub mod http;
pub mod menu;

pub use config::{validate_base_url, ClientConfig, DEFAULT_CONFIG_FILE};
pub use http::{decode_results, interpret_response, keyword_rows, translated_text, ApiClient};
pub use menu::{run_menu, Command};

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-200 status.
    #[error("Failed with status code: {status}\nurl: {url}{}", message_line(.message))]
    Status {
        status: u16,
        url: String,
        /// Response body, kept for 400 answers only.
        message: Option<String>,
    },

    /// A 200 response whose body did not have the expected shape.
    #[error("unexpected response from {url}: {detail}")]
    Decode { url: String, detail: String },

    #[error("PDF file '{0}' does not exist...")]
    MissingFile(PathBuf),

    #[error("could not read '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("baseurl '{url}' {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("{0}")]
    Config(String),
}

impl ClientError {
    /// URL the failed request targeted, when there was one.
    pub fn url(&self) -> Option<&str> {
        match self {
            ClientError::Transport { url, .. }
            | ClientError::Status { url, .. }
            | ClientError::Decode { url, .. } => Some(url),
            _ => None,
        }
    }
}

fn message_line(message: &Option<String>) -> String {
    match message {
        Some(m) => format!("\nError message: {m}"),
        None => String::new(),
    }
}
