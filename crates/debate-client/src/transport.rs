//! HTTP transport to the debate backend.
//!
//! Two calls matter: upload company documents and submit a decision. Both
//! come back as a normalized value or a [`TransportError`]; nothing here
//! retries.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use debate_presenter::{JudgeVerdict, RawEntry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;

/// Error from a backend call.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Backend reported failure: {0}")]
    Rejected(String),

    #[error("Failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No files to upload")]
    NoFiles,
}

/// Transcript and verdict of one debate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebateResult {
    #[serde(default)]
    pub transcript: Option<Vec<RawEntry>>,
    #[serde(default)]
    pub judge: Option<JudgeVerdict>,
}

/// Acknowledgement of a document upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Documents the backend accepted.
    pub added_files: usize,
}

/// Backend operations the client depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DebateTransport: Send + Sync {
    /// Upload documents for the agents to consult.
    async fn upload_documents(&self, paths: &[PathBuf]) -> Result<UploadReceipt, TransportError>;

    /// Run a debate on `decision` and return its full result.
    async fn submit_decision(&self, decision: &str) -> Result<DebateResult, TransportError>;

    /// Whether the backend answers its health probe.
    async fn health(&self) -> bool;
}

/// [`DebateTransport`] over HTTP.
pub struct HttpTransport {
    api_base: String,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(api_base: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            http: builder.build()?,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::new(&config.api_base, config.request_timeout())
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }
}

#[async_trait]
impl DebateTransport for HttpTransport {
    async fn upload_documents(&self, paths: &[PathBuf]) -> Result<UploadReceipt, TransportError> {
        if paths.is_empty() {
            return Err(TransportError::NoFiles);
        }

        let mut form = reqwest::multipart::Form::new();
        for path in paths {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| TransportError::ReadFile {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %path.display(), bytes = bytes.len(), "attaching document");
            let part = reqwest::multipart::Part::bytes(bytes).file_name(upload_name(path));
            form = form.part("files", part);
        }

        let url = self.endpoint("/company/upload-files");
        info!(%url, files = paths.len(), "uploading documents");
        let response = self.http.post(&url).multipart(form).send().await?;
        let body = success_body(response).await?;
        decode_upload_response(&body, paths.len())
    }

    async fn submit_decision(&self, decision: &str) -> Result<DebateResult, TransportError> {
        let url = self.endpoint("/simulate");
        info!(%url, "submitting decision");
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "decision": decision }))
            .send()
            .await?;
        let body = success_body(response).await?;
        decode_decision_response(&body)
    }

    async fn health(&self) -> bool {
        let url = self.endpoint("/health");
        match self.http.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<Value>().await {
                Ok(body) => body.get("status").and_then(Value::as_str) == Some("ok"),
                Err(e) => {
                    warn!(%url, error = %e, "health response was not JSON");
                    false
                }
            },
            Ok(resp) => {
                warn!(%url, status = resp.status().as_u16(), "health check failed");
                false
            }
            Err(e) => {
                warn!(%url, error = %e, "backend unreachable");
                false
            }
        }
    }
}

/// Name sent with an uploaded file.
pub(crate) fn upload_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Body of a 2xx response; anything else becomes [`TransportError::Status`]
/// carrying the body text (or the status line when the body is empty).
async fn success_body(response: reqwest::Response) -> Result<String, TransportError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        return Ok(body);
    }
    let body = if body.trim().is_empty() {
        status.to_string()
    } else {
        body
    };
    Err(TransportError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Decode a `/simulate` response.
///
/// `success` must be `true`; a failed run is rejected even if it carries a
/// partial result. When `result` is absent the top-level object is taken as
/// the result itself.
pub fn decode_decision_response(body: &str) -> Result<DebateResult, TransportError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;

    if value.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(TransportError::Rejected(describe_failure(&value)));
    }

    let result = match value.get("result") {
        Some(result) if !result.is_null() => result.clone(),
        _ => value,
    };
    serde_json::from_value(result).map_err(|e| TransportError::Decode(e.to_string()))
}

/// Decode an upload response. A missing `added_files` count falls back to
/// the number of files sent.
pub fn decode_upload_response(body: &str, sent: usize) -> Result<UploadReceipt, TransportError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;

    if value.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(TransportError::Rejected(describe_failure(&value)));
    }

    let added_files = value
        .get("added_files")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(sent);
    Ok(UploadReceipt { added_files })
}

/// Decode a saved debate: either a full `/simulate` response or a bare
/// `{ transcript, judge }` result.
pub fn decode_saved_result(body: &str) -> Result<DebateResult, TransportError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;
    if value.get("success").is_some() {
        return decode_decision_response(body);
    }
    serde_json::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
}

/// Human-readable reason from a failed response's `message`/`error`/`detail`.
fn describe_failure(value: &Value) -> String {
    let text = |key: &str| -> Option<String> {
        match value.get(key)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    };

    match (text("message"), text("error").or_else(|| text("detail"))) {
        (Some(message), Some(error)) => format!("{}: {}", message, error),
        (Some(message), None) => message,
        (None, Some(error)) => error,
        (None, None) => "no error details".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_presenter::normalize_transcript;

    #[test]
    fn test_decode_nested_result() {
        let result = decode_decision_response(
            r#"{
                "success": true,
                "decision": "Launch in EU?",
                "result": {
                    "transcript": [{"agent": "Finance", "text": "ok"}, "plain"],
                    "judge": {"final_recommendation": "accept", "reason": "fine"}
                }
            }"#,
        )
        .unwrap();

        let entries = normalize_transcript(result.transcript);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].agent, "Finance");
        assert_eq!(entries[1].agent, "Agent");
        assert_eq!(
            result.judge.unwrap().final_recommendation.as_deref(),
            Some("accept")
        );
    }

    #[test]
    fn test_decode_flat_result() {
        let result = decode_decision_response(
            r#"{"success": true, "transcript": ["a"], "judge": {"reason": "r"}}"#,
        )
        .unwrap();
        assert_eq!(result.transcript.unwrap().len(), 1);
        assert_eq!(result.judge.unwrap().reason.as_deref(), Some("r"));
    }

    #[test]
    fn test_missing_judge_is_none() {
        let result =
            decode_decision_response(r#"{"success": true, "result": {"transcript": []}}"#).unwrap();
        assert!(result.judge.is_none());
        assert_eq!(result.transcript, Some(Vec::new()));
    }

    #[test]
    fn test_failure_with_partial_result_is_rejected() {
        let err = decode_decision_response(
            r#"{
                "success": false,
                "message": "Debate ran but failed to save result to DB.",
                "error": "disk full",
                "result": {"transcript": ["x"]}
            }"#,
        )
        .unwrap_err();
        match err {
            TransportError::Rejected(msg) => {
                assert_eq!(msg, "Debate ran but failed to save result to DB.: disk full")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_object_error_rendered_as_json() {
        let err = decode_decision_response(r#"{"success": false, "error": {"code": 7}}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), r#"Backend reported failure: {"code":7}"#);
    }

    #[test]
    fn test_missing_success_flag_is_failure() {
        let err = decode_decision_response(r#"{"detail": "Decision text is required."}"#)
            .unwrap_err();
        assert!(matches!(err, TransportError::Rejected(ref m) if m == "Decision text is required."));
    }

    #[test]
    fn test_garbage_body() {
        let err = decode_decision_response("<html>").unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[test]
    fn test_upload_count_fallback() {
        let receipt = decode_upload_response(r#"{"success": true, "added_files": 2}"#, 3).unwrap();
        assert_eq!(receipt.added_files, 2);
        let receipt = decode_upload_response(r#"{"success": true}"#, 3).unwrap();
        assert_eq!(receipt.added_files, 3);
    }

    #[test]
    fn test_upload_failure() {
        let err = decode_upload_response(r#"{"success": false, "error": "bad"}"#, 1).unwrap_err();
        assert!(matches!(err, TransportError::Rejected(ref m) if m == "bad"));
    }

    #[test]
    fn test_saved_result_accepts_both_layouts() {
        let bare = decode_saved_result(r#"{"transcript": ["hi"], "judge": null}"#).unwrap();
        assert_eq!(bare.transcript.unwrap().len(), 1);
        assert!(bare.judge.is_none());

        let wrapped =
            decode_saved_result(r#"{"success": true, "result": {"transcript": ["hi"]}}"#).unwrap();
        assert_eq!(wrapped.transcript.unwrap().len(), 1);
    }

    #[test]
    fn test_upload_name() {
        assert_eq!(upload_name(Path::new("/tmp/docs/policy.md")), "policy.md");
        assert_eq!(upload_name(Path::new("/")), "document");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let transport = HttpTransport::new("http://localhost:8000/", None).unwrap();
        assert_eq!(transport.api_base(), "http://localhost:8000");
        assert_eq!(
            transport.endpoint("/simulate"),
            "http://localhost:8000/simulate"
        );
    }

    #[tokio::test]
    async fn test_upload_without_files() {
        let transport = HttpTransport::new("http://localhost:8000", None).unwrap();
        let err = transport.upload_documents(&[]).await.unwrap_err();
        assert!(matches!(err, TransportError::NoFiles));
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let transport = HttpTransport::new("http://localhost:8000", None).unwrap();
        let missing = dir.path().join("absent.txt");
        let err = transport.upload_documents(&[missing.clone()]).await.unwrap_err();
        match err {
            TransportError::ReadFile { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }
}
