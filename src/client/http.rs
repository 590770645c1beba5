//! Typed calls against the translation web service.

use super::config::validate_base_url;
use super::ClientError;
use crate::api::{
    decode_base64, encode_base64, parse_keywords, Job, Keyword, TranslateRequest,
    TranslateResponse, UploadRequest, User,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Client for the web service rooted at one base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` is validated and stripped of a trailing `/`.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        let base_url = validate_base_url(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ClientError::Config(format!("HTTP client: {e}")))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base_url}{path}`; `path` starts with `/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, url: String, req: reqwest::RequestBuilder) -> Result<serde_json::Value, ClientError> {
        debug!("{}", url);
        let response = req.send().await.map_err(|e| ClientError::Transport {
            url: url.clone(),
            source: e,
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| ClientError::Transport {
            url: url.clone(),
            source: e,
        })?;
        interpret_response(status, &url, &body)
    }

    async fn get(&self, path: &str) -> Result<serde_json::Value, ClientError> {
        let url = self.url(path);
        self.send(url.clone(), self.http.get(&url)).await
    }

    /// `GET /users`
    pub async fn users(&self) -> Result<Vec<User>, ClientError> {
        let url = self.url("/users");
        decode_body(&url, self.get("/users").await?)
    }

    /// `GET /jobs`
    pub async fn jobs(&self) -> Result<Vec<Job>, ClientError> {
        let url = self.url("/jobs");
        decode_body(&url, self.get("/jobs").await?)
    }

    /// `POST /upload/{userid}`; returns the new job id as sent by the API.
    pub async fn upload(&self, pdf: &Path, userid: &str) -> Result<serde_json::Value, ClientError> {
        let bytes = read_local_pdf(pdf).await?;
        let body = UploadRequest {
            filename: pdf.to_string_lossy().into_owned(),
            data: encode_base64(&bytes),
        };
        let url = self.url(&format!("/upload/{}", userid.trim()));
        self.send(url.clone(), self.http.post(&url).json(&body)).await
    }

    /// `GET /download/{jobid}`; the body is the base64 results file.
    pub async fn download(&self, jobid: &str) -> Result<String, ClientError> {
        let url = self.url(&format!("/download/{}", jobid.trim()));
        let body = self.send(url.clone(), self.http.get(&url)).await?;
        decode_results(&url, body)
    }

    /// `DELETE /reset`; returns the server's message.
    pub async fn reset(&self) -> Result<serde_json::Value, ClientError> {
        let url = self.url("/reset");
        self.send(url.clone(), self.http.delete(&url)).await
    }

    /// `GET /keywords`; rows live under the `body` field.
    pub async fn keywords(&self) -> Result<Vec<Keyword>, ClientError> {
        let url = self.url("/keywords");
        let body = self.get("/keywords").await?;
        keyword_rows(&url, &body)
    }

    /// `POST /translate`; `None` when the answer carries no `translatedText`.
    pub async fn translate(
        &self,
        pdf: &Path,
        language_code: &str,
    ) -> Result<Option<String>, ClientError> {
        let bytes = read_local_pdf(pdf).await?;
        let request = TranslateRequest::new(pdf.to_string_lossy(), &bytes, language_code.trim());
        let url = self.url("/translate");
        let body = self.send(url.clone(), self.http.post(&url).json(&request)).await?;
        translated_text(&url, body)
    }
}

/// Map a status and raw body onto the API's response contract: 200 carries
/// JSON, anything else is an error, and 400 bodies carry a message.
pub fn interpret_response(
    status: StatusCode,
    url: &str,
    body: &str,
) -> Result<serde_json::Value, ClientError> {
    if status != StatusCode::OK {
        return Err(ClientError::Status {
            status: status.as_u16(),
            url: url.to_string(),
            message: (status == StatusCode::BAD_REQUEST).then(|| body.trim().to_string()),
        });
    }
    serde_json::from_str(body).map_err(|e| ClientError::Decode {
        url: url.to_string(),
        detail: format!("body is not JSON: {e}"),
    })
}

/// A `/download` body: a JSON string holding the base64 of a UTF-8 file.
pub fn decode_results(url: &str, body: serde_json::Value) -> Result<String, ClientError> {
    let encoded: String = decode_body(url, body)?;
    let bytes = decode_base64(&encoded).map_err(|e| ClientError::Decode {
        url: url.to_string(),
        detail: format!("results are not base64: {e}"),
    })?;
    String::from_utf8(bytes).map_err(|e| ClientError::Decode {
        url: url.to_string(),
        detail: format!("results are not UTF-8: {e}"),
    })
}

/// A `/keywords` body: the rows live under its `body` field.
pub fn keyword_rows(url: &str, body: &serde_json::Value) -> Result<Vec<Keyword>, ClientError> {
    let rows = body.get("body").ok_or_else(|| ClientError::Decode {
        url: url.to_string(),
        detail: "missing 'body' field".into(),
    })?;
    parse_keywords(rows).map_err(|detail| ClientError::Decode {
        url: url.to_string(),
        detail,
    })
}

/// A `/translate` body; `None` when it carries no `translatedText`.
pub fn translated_text(url: &str, body: serde_json::Value) -> Result<Option<String>, ClientError> {
    let response: TranslateResponse = decode_body(url, body)?;
    Ok(response.translated_text)
}

fn decode_body<T: DeserializeOwned>(url: &str, body: serde_json::Value) -> Result<T, ClientError> {
    serde_json::from_value(body).map_err(|e| ClientError::Decode {
        url: url.to_string(),
        detail: e.to_string(),
    })
}

async fn read_local_pdf(path: &Path) -> Result<Vec<u8>, ClientError> {
    if !path.is_file() {
        return Err(ClientError::MissingFile(path.to_path_buf()));
    }
    tokio::fs::read(path).await.map_err(|e| ClientError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://api.example.com/jobs";

    #[test]
    fn ok_json_is_returned() {
        let v = interpret_response(StatusCode::OK, URL, r#"[[1, 2, "done", "a", "b", "c"]]"#).unwrap();
        let jobs: Vec<Job> = decode_body(URL, v).unwrap();
        assert_eq!(jobs[0].status, "done");
    }

    #[test]
    fn ok_non_json_is_decode_error() {
        let err = interpret_response(StatusCode::OK, URL, "<html>").unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    #[test]
    fn bad_request_keeps_message() {
        let err =
            interpret_response(StatusCode::BAD_REQUEST, URL, "{\"message\":\"bad\"}\n").unwrap_err();
        match err {
            ClientError::Status { status, url, message } => {
                assert_eq!(status, 400);
                assert_eq!(url, URL);
                assert_eq!(message.as_deref(), Some("{\"message\":\"bad\"}"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn other_status_has_no_message() {
        let err = interpret_response(StatusCode::INTERNAL_SERVER_ERROR, URL, "boom").unwrap_err();
        assert!(matches!(
            err,
            ClientError::Status { status: 500, message: None, .. }
        ));
    }

    #[test]
    fn decode_body_reports_shape_errors() {
        let err = decode_body::<Vec<User>>(URL, json!({"users": []})).unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    #[test]
    fn download_body_is_decoded_to_text() {
        let url = "https://api.example.com/download/7";
        let body = json!(encode_base64("Grüße\n".as_bytes()));
        assert_eq!(decode_results(url, body).unwrap(), "Grüße\n");

        let err = decode_results(url, json!("***")).unwrap_err();
        match err {
            ClientError::Decode { url: u, detail } => {
                assert_eq!(u, url);
                assert!(detail.contains("base64"), "{detail}");
            }
            other => panic!("unexpected: {other:?}"),
        }

        let err = decode_results(url, json!(encode_base64(&[0xff, 0xfe]))).unwrap_err();
        assert!(matches!(err, ClientError::Decode { ref detail, .. } if detail.contains("UTF-8")));

        let err = decode_results(url, json!({"data": "x"})).unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    #[test]
    fn keywords_come_from_the_body_field() {
        let url = "https://api.example.com/keywords";
        let rows = keyword_rows(url, &json!({"body": "[(1, 'invoice'), (2, 'tax')]"})).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].keyword, "tax");

        assert!(keyword_rows(url, &json!({"body": []})).unwrap().is_empty());

        let err = keyword_rows(url, &json!({"rows": []})).unwrap_err();
        assert!(matches!(err, ClientError::Decode { ref detail, .. } if detail.contains("body")));
    }

    #[test]
    fn translate_body_may_lack_text() {
        let url = "https://api.example.com/translate";
        assert_eq!(
            translated_text(url, json!({"message": "ok", "translatedText": "Hola"})).unwrap(),
            Some("Hola".to_string())
        );
        assert_eq!(translated_text(url, json!({"message": "ok"})).unwrap(), None);
    }

    #[test]
    fn urls_join_without_double_slash() {
        let client = ApiClient::new("https://api.example.com/prod/", 5).unwrap();
        assert_eq!(client.url("/users"), "https://api.example.com/prod/users");
        assert!(ApiClient::new("short", 5).is_err());
    }

    #[tokio::test]
    async fn missing_pdf_is_reported_before_any_request() {
        let client = ApiClient::new("http://127.0.0.1:1/prod", 5).unwrap();
        let err = client
            .translate(Path::new("/nonexistent/doc.pdf"), "es")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingFile(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let client = ApiClient::new("http://127.0.0.1:1/prod", 5).unwrap();
        let err = client.users().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }), "{err:?}");
        assert_eq!(err.url(), Some("http://127.0.0.1:1/prod/users"));
    }
}
