//! Object storage: fetch source documents and persist translated results.
//!
//! The pipeline talks to storage only through [`ObjectStore`], so the same
//! run can target a directory on disk ([`LocalObjectStore`]) or an HTTP
//! bucket endpoint ([`HttpObjectStore`]) such as an S3-compatible gateway.

use crate::error::TranslateError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Header asking S3-compatible stores to apply a canned ACL.
const ACL_HEADER: &str = "x-amz-acl";

/// Options applied when writing an object.
#[derive(Debug, Clone)]
pub struct PutOptions {
    pub content_type: String,
    /// Request a world-readable object where the backend supports ACLs.
    pub public_read: bool,
}

impl Default for PutOptions {
    fn default() -> Self {
        Self {
            content_type: "application/octet-stream".to_string(),
            public_read: false,
        }
    }
}

/// Key/value blob storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download the object stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, TranslateError>;

    /// Upload `bytes` under `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: Vec<u8>, options: &PutOptions)
        -> Result<(), TranslateError>;
}

/// Derive the result key from a source key: `docs/report.pdf` → `docs/report.txt`.
///
/// Keys without a `.pdf` suffix keep their full name and gain `.txt`.
pub fn result_key_for(source_key: &str) -> String {
    let stem = match source_key.len().checked_sub(4) {
        Some(cut)
            if source_key.is_char_boundary(cut)
                && source_key[cut..].eq_ignore_ascii_case(".pdf") =>
        {
            &source_key[..cut]
        }
        _ => source_key,
    };
    format!("{stem}.txt")
}

/// Key under which a directly submitted document is stored: `uploads/<file name>`.
///
/// Only the final path component of `filename` is kept.
pub fn upload_key_for(filename: &str) -> Result<String, TranslateError> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." {
        return Err(TranslateError::InvalidRequest(format!(
            "unusable file name '{}'",
            filename
        )));
    }
    Ok(format!("uploads/{name}"))
}

// ── Local directory store ────────────────────────────────────────────────

/// A store rooted at a local directory; keys map to relative paths.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a key to a path under the root, refusing keys that would escape it.
    fn path_for(&self, key: &str) -> Result<PathBuf, TranslateError> {
        let mut path = self.root.clone();
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\')
            {
                return Err(TranslateError::StorageFailed {
                    key: key.to_string(),
                    reason: "key must be a relative path without '.' or '..' segments".into(),
                });
            }
            path.push(segment);
        }
        Ok(path)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, TranslateError> {
        let path = self.path_for(key)?;
        debug!("Reading object {} from {}", key, path.display());
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TranslateError::ObjectNotFound {
                    key: key.to_string(),
                }
            } else {
                TranslateError::StorageFailed {
                    key: key.to_string(),
                    reason: e.to_string(),
                }
            }
        })
    }

    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _options: &PutOptions,
    ) -> Result<(), TranslateError> {
        let path = self.path_for(key)?;
        let write_err = |e: std::io::Error| TranslateError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        // Atomic write: write to temp, then rename
        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);
        tokio::fs::write(&tmp_path, &bytes).await.map_err(write_err)?;
        tokio::fs::rename(&tmp_path, &path).await.map_err(write_err)?;

        info!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(())
    }
}

// ── HTTP bucket store ────────────────────────────────────────────────────

/// A store reached with plain `GET`/`PUT` requests against `{base_url}/{key}`.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpObjectStore {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, TranslateError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            TranslateError::InvalidConfig(format!("invalid bucket URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TranslateError::InvalidConfig(format!(
                "bucket URL '{}' cannot carry object paths",
                base_url
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TranslateError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Full URL of an object; each key segment is percent-encoded.
    pub fn object_url(&self, key: &str) -> Result<Url, TranslateError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TranslateError::StorageFailed {
                key: key.to_string(),
                reason: "bucket URL cannot carry object paths".into(),
            })?
            .pop_if_empty()
            .extend(key.split('/'));
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let req = self.client.request(method, url);
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }
}

fn storage_failed(key: &str, e: impl std::fmt::Display) -> TranslateError {
    TranslateError::StorageFailed {
        key: key.to_string(),
        reason: e.to_string(),
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, TranslateError> {
        let url = self.object_url(key)?;
        debug!("GET {}", url);

        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| storage_failed(key, e))?;

        match response.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(TranslateError::ObjectNotFound {
                    key: key.to_string(),
                })
            }
            s => return Err(storage_failed(key, format!("HTTP {s}"))),
        }

        let bytes = response.bytes().await.map_err(|e| storage_failed(key, e))?;
        Ok(bytes.to_vec())
    }

    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        options: &PutOptions,
    ) -> Result<(), TranslateError> {
        let url = self.object_url(key)?;
        let len = bytes.len();
        debug!("PUT {} ({} bytes)", url, len);

        let mut req = self
            .request(reqwest::Method::PUT, url)
            .header(CONTENT_TYPE, options.content_type.as_str())
            .body(bytes);
        if options.public_read {
            req = req.header(ACL_HEADER, "public-read");
        }

        let response = req.send().await.map_err(|e| storage_failed(key, e))?;
        if !response.status().is_success() {
            return Err(storage_failed(key, format!("HTTP {}", response.status())));
        }

        info!("Uploaded {} bytes to {}", len, key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_key_replaces_pdf_suffix() {
        assert_eq!(result_key_for("report.pdf"), "report.txt");
        assert_eq!(result_key_for("a/b/Report.PDF"), "a/b/Report.txt");
        assert_eq!(result_key_for("notes"), "notes.txt");
        assert_eq!(result_key_for("pdf"), "pdf.txt");
        assert_eq!(result_key_for("héllo"), "héllo.txt");
    }

    #[test]
    fn upload_key_keeps_only_file_name() {
        assert_eq!(upload_key_for("doc.pdf").unwrap(), "uploads/doc.pdf");
        assert_eq!(
            upload_key_for("/home/me/papers/doc.pdf").unwrap(),
            "uploads/doc.pdf"
        );
        assert_eq!(
            upload_key_for("C:\\Users\\me\\doc.pdf").unwrap(),
            "uploads/doc.pdf"
        );
        assert!(upload_key_for("").is_err());
        assert!(upload_key_for("dir/").is_err());
        assert!(upload_key_for("..").is_err());
    }

    #[tokio::test]
    async fn local_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store
            .put("nested/doc.txt", b"hallo".to_vec(), &PutOptions::default())
            .await
            .unwrap();
        assert!(dir.path().join("nested/doc.txt").exists());
        assert!(!dir.path().join("nested/doc.txt.tmp").exists());
        assert_eq!(store.get("nested/doc.txt").await.unwrap(), b"hallo");
    }

    #[tokio::test]
    async fn local_store_missing_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let err = store.get("absent.pdf").await.unwrap_err();
        assert!(matches!(err, TranslateError::ObjectNotFound { .. }));
    }

    #[tokio::test]
    async fn local_store_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        for key in ["../etc/passwd", "a//b", "/abs", "a/./b"] {
            let err = store.get(key).await.unwrap_err();
            assert!(
                matches!(err, TranslateError::StorageFailed { .. }),
                "key {key:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn http_store_encodes_key_segments() {
        let store = HttpObjectStore::new("https://bucket.example.com/data/", 5).unwrap();
        let url = store.object_url("in box/report 1.pdf").unwrap();
        assert_eq!(
            url.as_str(),
            "https://bucket.example.com/data/in%20box/report%201.pdf"
        );

        let store = HttpObjectStore::new("https://bucket.example.com", 5).unwrap();
        assert_eq!(
            store.object_url("a.pdf").unwrap().as_str(),
            "https://bucket.example.com/a.pdf"
        );
    }

    #[test]
    fn http_store_rejects_bad_base_url() {
        assert!(HttpObjectStore::new("not a url", 5).is_err());
        assert!(HttpObjectStore::new("mailto:someone@example.com", 5).is_err());
    }

    #[tokio::test]
    async fn http_store_unreachable_is_storage_failure() {
        // Port 1 on loopback refuses connections.
        let store = HttpObjectStore::new("http://127.0.0.1:1/bucket", 5).unwrap();
        let err = store.get("doc.pdf").await.unwrap_err();
        assert!(matches!(err, TranslateError::StorageFailed { .. }), "{err:?}");
    }
}
