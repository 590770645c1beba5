//! Client configuration file.
//!
//! ```toml
//! [client]
//! webservice = "https://abc123.execute-api.us-east-2.amazonaws.com/prod"
//! ```

use super::ClientError;
use serde::Deserialize;
use std::path::Path;

/// File read when the user does not name one.
pub const DEFAULT_CONFIG_FILE: &str = "translate-client-config.toml";

/// Value shipped in the sample config; never a real endpoint.
pub const PLACEHOLDER_BASE_URL: &str = "https://YOUR_GATEWAY_API.amazonaws.com";

const MIN_BASE_URL_LEN: usize = 16;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub client: ClientSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSection {
    /// Base URL of the web service.
    pub webservice: String,
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self, ClientError> {
        if !path.is_file() {
            return Err(ClientError::Config(format!(
                "config file '{}' does not exist",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| ClientError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ClientError> {
        toml::from_str(text).map_err(|e| ClientError::Config(format!("invalid config: {e}")))
    }

    /// The validated base URL, without a trailing `/`.
    pub fn base_url(&self) -> Result<String, ClientError> {
        validate_base_url(&self.client.webservice)
    }
}

/// Reject URLs that are too short or still the placeholder, and drop one
/// trailing `/`.
pub fn validate_base_url(raw: &str) -> Result<String, ClientError> {
    let url = raw.trim();
    if url.len() < MIN_BASE_URL_LEN {
        return Err(ClientError::InvalidBaseUrl {
            url: url.to_string(),
            reason: "is not nearly long enough...".into(),
        });
    }
    if url == PLACEHOLDER_BASE_URL {
        return Err(ClientError::InvalidBaseUrl {
            url: url.to_string(),
            reason: "is the placeholder; update the config file with your gateway endpoint"
                .into(),
        });
    }
    Ok(url.strip_suffix('/').unwrap_or(url).to_string())
}
