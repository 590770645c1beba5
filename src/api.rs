//! Wire types shared by the handler and the client.
//!
//! Rows returned by the remote API are JSON arrays (`[userid, username,
//! pwdhash]`); the structs here deserialise from that positional form.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /upload/{userid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub filename: String,
    /// Base64 (standard alphabet) document bytes.
    pub data: String,
}

/// Body of `POST /translate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub filename: String,
    /// Base64 (standard alphabet) PDF bytes.
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

impl TranslateRequest {
    pub fn new(filename: impl Into<String>, bytes: &[u8], language_code: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            data: encode_base64(bytes),
            language_code: Some(language_code.into()),
        }
    }

    pub fn decode_data(&self) -> Result<Vec<u8>, base64::DecodeError> {
        decode_base64(&self.data)
    }
}

/// Success body of a translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub message: String,
    #[serde(rename = "translatedText", default, skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
}

/// JSON error body returned with 400 responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub userid: i64,
    pub username: String,
    pub pwdhash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub jobid: i64,
    pub userid: i64,
    pub status: String,
    pub originaldatafile: String,
    pub datafilekey: Option<String>,
    pub resultsfilekey: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub keywordid: i64,
    pub keyword: String,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.userid)?;
        writeln!(f, "  {}", self.username)?;
        write!(f, "  {}", self.pwdhash)
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.jobid)?;
        writeln!(f, "  {}", self.userid)?;
        writeln!(f, "  {}", self.status)?;
        writeln!(f, "  {}", self.originaldatafile)?;
        writeln!(f, "  {}", self.datafilekey.as_deref().unwrap_or("None"))?;
        write!(f, "  {}", self.resultsfilekey.as_deref().unwrap_or("None"))
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Keyword ID: {}", self.keywordid)?;
        write!(f, "  Keyword: {}", self.keyword)
    }
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_base64(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(data.trim())
}

// ── Keyword listings ─────────────────────────────────────────────────────

/// Decode the `body` field of a `GET /keywords` response.
///
/// The field may be a JSON array of rows, a string holding such an array,
/// or a string holding a Python literal list of `(id, 'keyword')` tuples.
pub fn parse_keywords(body: &serde_json::Value) -> Result<Vec<Keyword>, String> {
    match body {
        serde_json::Value::String(s) => parse_keyword_literal(s),
        other => serde_json::from_value(other.clone()).map_err(|e| e.to_string()),
    }
}

/// Parse a keyword listing held in a string: JSON first, then a Python
/// literal rewritten into JSON.
pub fn parse_keyword_literal(s: &str) -> Result<Vec<Keyword>, String> {
    if let Ok(rows) = serde_json::from_str::<Vec<Keyword>>(s) {
        return Ok(rows);
    }
    let json = python_literal_to_json(s)?;
    serde_json::from_str(&json).map_err(|e| format!("not a keyword list: {e}"))
}

/// Rewrite a Python literal built from lists, tuples, numbers, strings,
/// `None`, `True` and `False` into JSON text.
fn python_literal_to_json(s: &str) -> Result<String, String> {
    let mut out = String::with_capacity(s.len() + 8);
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '(' => out.push('['),
            ')' | ']' => {
                // `(1,)` and `[1, 2,]` carry a trailing comma JSON rejects.
                let trimmed = out.trim_end_matches(char::is_whitespace).len();
                out.truncate(trimmed);
                if out.ends_with(',') {
                    out.pop();
                }
                out.push(']');
            }
            '\'' | '"' => {
                let quote = c;
                let mut value = String::new();
                let mut closed = false;
                while let Some(ch) = chars.next() {
                    match ch {
                        '\\' => match chars.next() {
                            Some('n') => value.push('\n'),
                            Some('t') => value.push('\t'),
                            Some('r') => value.push('\r'),
                            Some(other) => value.push(other),
                            None => return Err("unterminated escape".into()),
                        },
                        ch if ch == quote => {
                            closed = true;
                            break;
                        }
                        ch => value.push(ch),
                    }
                }
                if !closed {
                    return Err("unterminated string literal".into());
                }
                out.push_str(&serde_json::Value::String(value).to_string());
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match word.as_str() {
                    "None" => out.push_str("null"),
                    "True" => out.push_str("true"),
                    "False" => out.push_str("false"),
                    _ => return Err(format!("unexpected identifier '{word}'")),
                }
            }
            c => out.push(c),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rows_decode_from_arrays() {
        let users: Vec<User> =
            serde_json::from_value(json!([[80001, "p_sarkar", "a1b2"]])).unwrap();
        assert_eq!(users[0].userid, 80001);
        assert_eq!(users[0].username, "p_sarkar");

        let jobs: Vec<Job> = serde_json::from_value(json!([
            [1, 80001, "completed", "doc.pdf", "uploads/doc.pdf", "uploads/doc.txt"],
            [2, 80001, "uploaded", "b.pdf", "uploads/b.pdf", null]
        ]))
        .unwrap();
        assert_eq!(jobs[0].resultsfilekey.as_deref(), Some("uploads/doc.txt"));
        assert_eq!(jobs[1].resultsfilekey, None);
    }

    #[test]
    fn job_display_lists_all_fields() {
        let job = Job {
            jobid: 7,
            userid: 3,
            status: "pending".into(),
            originaldatafile: "a.pdf".into(),
            datafilekey: Some("k/a.pdf".into()),
            resultsfilekey: None,
        };
        assert_eq!(
            job.to_string(),
            "7\n  3\n  pending\n  a.pdf\n  k/a.pdf\n  None"
        );
    }

    #[test]
    fn translate_response_uses_camel_case_field() {
        let body = json!({"message": "Translation successful", "translatedText": "Hallo"});
        let r: TranslateResponse = serde_json::from_value(body).unwrap();
        assert_eq!(r.translated_text.as_deref(), Some("Hallo"));

        let r: TranslateResponse = serde_json::from_value(json!({"message": "ok"})).unwrap();
        assert_eq!(r.translated_text, None);
    }

    #[test]
    fn translate_request_carries_base64() {
        let req = TranslateRequest::new("doc.pdf", b"%PDF-1.4", "es");
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["data"], "JVBERi0xLjQ=");
        assert_eq!(v["language_code"], "es");
        assert_eq!(req.decode_data().unwrap(), b"%PDF-1.4");

        let bare: TranslateRequest =
            serde_json::from_value(json!({"filename": "a.pdf", "data": ""})).unwrap();
        assert_eq!(bare.language_code, None);
    }

    #[test]
    fn keywords_from_json_array() {
        let kws = parse_keywords(&json!([[1, "invoice"], [2, "total"]])).unwrap();
        assert_eq!(kws.len(), 2);
        assert_eq!(kws[1].keyword, "total");
    }

    #[test]
    fn keywords_from_json_string() {
        let kws = parse_keywords(&json!("[[5, \"tax\"]]")).unwrap();
        assert_eq!(kws[0].keywordid, 5);
    }

    #[test]
    fn keywords_from_python_literal() {
        let kws = parse_keywords(&json!("[(1, 'invoice'), (2, \"it's\"), (3, 'a\\'b')]")).unwrap();
        assert_eq!(
            kws,
            vec![
                Keyword { keywordid: 1, keyword: "invoice".into() },
                Keyword { keywordid: 2, keyword: "it's".into() },
                Keyword { keywordid: 3, keyword: "a'b".into() },
            ]
        );
        assert!(parse_keywords(&json!("[]")).unwrap().is_empty());
        assert!(parse_keywords(&json!("((1, 'x'),)")).is_ok());
    }

    #[test]
    fn keywords_reject_garbage() {
        assert!(parse_keywords(&json!("[(1, 'open")).is_err());
        assert!(parse_keywords(&json!("[(1, foo)]")).is_err());
        assert!(parse_keywords(&json!({"id": 1})).is_err());
    }
}
