//! Event-driven entry points: turn a storage notification or a direct
//! translate request into a pipeline run and a status-code + JSON response.
//!
//! Every pipeline failure is logged and collapsed into the same generic
//! 500 response; callers never see partial results.

use crate::api::{ErrorBody, TranslateRequest, TranslateResponse};
use crate::error::TranslateError;
use crate::pipeline::storage::{upload_key_for, PutOptions};
use crate::runner::TranslationPipeline;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Body of every failed run.
pub const FAILURE_MESSAGE: &str = "Error occurred in lambda function";

/// Message of every successful run.
pub const SUCCESS_MESSAGE: &str = "Translation successful";

// ── Storage events ───────────────────────────────────────────────────────

/// An object-created notification in the S3 event layout:
/// `{"Records": [{"s3": {"object": {"key": "..."}}}], "target_language": "es"}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<EventRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3Entity {
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3Object {
    /// URL-encoded object key, `+` standing for a space.
    pub key: String,
}

impl StorageEvent {
    pub fn from_json(value: &serde_json::Value) -> Result<Self, TranslateError> {
        Self::deserialize(value).map_err(|e| TranslateError::InvalidEvent(e.to_string()))
    }

    /// Event for a single key; `key` is taken as already decoded.
    pub fn for_key(key: &str, target_language: Option<String>) -> Self {
        Self {
            records: vec![EventRecord {
                s3: S3Entity {
                    object: S3Object {
                        key: encode_key(key),
                    },
                },
            }],
            target_language,
        }
    }

    /// Decoded key of the first record.
    pub fn source_key(&self) -> Result<String, TranslateError> {
        let raw = self
            .records
            .first()
            .map(|r| r.s3.object.key.as_str())
            .ok_or_else(|| TranslateError::InvalidEvent("event has no records".into()))?;
        let key = unquote_plus(raw);
        if key.is_empty() {
            return Err(TranslateError::InvalidEvent("object key is empty".into()));
        }
        Ok(key)
    }
}

/// Decode `%XX` escapes and `+` as space; invalid UTF-8 is replaced.
pub fn unquote_plus(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 2;
                    }
                    _ => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

/// Inverse of [`unquote_plus`] for the characters that matter in keys.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        match b {
            b' ' => out.push('+'),
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            b => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

// ── Responses ────────────────────────────────────────────────────────────

/// Status code plus JSON body, as returned to the API gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: serde_json::Value,
}

impl HandlerResponse {
    pub fn success(translated_text: String) -> Self {
        let body = TranslateResponse {
            message: SUCCESS_MESSAGE.to_string(),
            translated_text: Some(translated_text),
        };
        Self {
            status_code: 200,
            body: serde_json::to_value(body).unwrap_or(serde_json::Value::Null),
        }
    }

    pub fn failure() -> Self {
        Self {
            status_code: 500,
            body: serde_json::Value::String(FAILURE_MESSAGE.to_string()),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        let body = ErrorBody {
            message: message.into(),
        };
        Self {
            status_code: 400,
            body: serde_json::to_value(body).unwrap_or(serde_json::Value::Null),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// Gateway envelope: `{"statusCode": N, "body": "<json text>"}`.
    pub fn to_gateway_json(&self) -> serde_json::Value {
        serde_json::json!({
            "statusCode": self.status_code,
            "body": self.body.to_string(),
        })
    }
}

// ── Entry points ─────────────────────────────────────────────────────────

/// Run the pipeline for the object named in a storage event.
pub async fn handle_storage_event(
    pipeline: &TranslationPipeline,
    event: &serde_json::Value,
) -> HandlerResponse {
    let result = async {
        let event = StorageEvent::from_json(event)?;
        let key = event.source_key()?;
        info!("Storage event for {}", key);
        pipeline.run(&key, event.target_language.as_deref()).await
    }
    .await;

    match result {
        Ok(output) => HandlerResponse::success(output.translated_text),
        Err(e) => {
            error!("Translation failed: {}", e);
            HandlerResponse::failure()
        }
    }
}

/// Store a directly submitted PDF under `uploads/<file name>` and translate it.
///
/// An undecodable request answers 400; pipeline failures answer 500.
pub async fn handle_translate_request(
    pipeline: &TranslationPipeline,
    request: &TranslateRequest,
) -> HandlerResponse {
    let bytes = match request.decode_data() {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Rejecting translate request for '{}': {}", request.filename, e);
            return HandlerResponse::bad_request(format!("data is not valid base64: {e}"));
        }
    };
    let key = match upload_key_for(&request.filename) {
        Ok(key) => key,
        Err(e) => {
            error!("{}", e);
            return HandlerResponse::bad_request(e.to_string());
        }
    };

    let options = PutOptions {
        content_type: "application/pdf".to_string(),
        public_read: false,
    };
    let result = async {
        pipeline.store().put(&key, bytes, &options).await?;
        pipeline.run(&key, request.language_code.as_deref()).await
    }
    .await;

    match result {
        Ok(output) => HandlerResponse::success(output.translated_text),
        Err(e) => {
            error!("Translation of '{}' failed: {}", request.filename, e);
            HandlerResponse::failure()
        }
    }
}

/// Parse a raw JSON body and hand it to [`handle_translate_request`].
pub async fn handle_translate_body(pipeline: &TranslationPipeline, body: &str) -> HandlerResponse {
    match serde_json::from_str::<TranslateRequest>(body) {
        Ok(request) => handle_translate_request(pipeline, &request).await,
        Err(e) => {
            error!("Malformed translate request: {}", e);
            HandlerResponse::bad_request(format!("malformed request: {e}"))
        }
    }
}
