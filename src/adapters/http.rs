//! HTTP client for the SoundScout matching API.
//!
//! Endpoint: POST /api/match (multipart, single `file` part)
//! Health:   GET  /api/health

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::debug;

use super::{MatchError, MatchOutcome, MatchService};
use crate::domain::{AudioClip, Match};

/// Path of the matching endpoint, relative to the service base URL
pub const MATCH_PATH: &str = "/api/match";

/// Path of the health endpoint
pub const HEALTH_PATH: &str = "/api/health";

/// Multipart field carrying the audio payload
const FILE_FIELD: &str = "file";

/// Matching service reached over HTTP
pub struct HttpMatchService {
    /// Base URL, e.g. `http://localhost:8000`
    base_url: String,
    /// HTTP client (no request timeout)
    client: reqwest::Client,
}

/// Decoded success body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResponse {
    /// Candidate tracks, in service order
    pub matches: Vec<Match>,
    /// Server-side processing time, if reported
    pub processing_time_ms: Option<f64>,
    /// Confidence threshold the service applied, if reported
    pub confidence_threshold: Option<f64>,
}

impl HttpMatchService {
    /// Create a new client for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn build_form(clip: &AudioClip) -> std::result::Result<Form, MatchError> {
        let part = Part::bytes(clip.bytes().to_vec())
            .file_name(clip.file_name())
            .mime_str(clip.mime_type())
            .map_err(|e| MatchError::Transport(e.to_string()))?;

        Ok(Form::new().part(FILE_FIELD, part))
    }
}

#[async_trait]
impl MatchService for HttpMatchService {
    fn name(&self) -> &str {
        "http"
    }

    async fn submit(&self, clip: &AudioClip) -> MatchOutcome {
        let url = self.api_url(MATCH_PATH);
        let form = Self::build_form(clip)?;

        debug!(%url, bytes = clip.len(), digest = %clip.digest(), "posting clip");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MatchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "matching service rejected clip");
            return Err(MatchError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| MatchError::Transport(e.to_string()))?;

        let decoded = decode_match_response(&body)?;
        debug!(
            matches = decoded.matches.len(),
            processing_time_ms = ?decoded.processing_time_ms,
            confidence_threshold = ?decoded.confidence_threshold,
            "matching service responded"
        );

        Ok(decoded.matches)
    }

    async fn health_check(&self) -> Result<()> {
        let url = self.api_url(HEALTH_PATH);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach matching service at {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Matching service health check failed ({}): {}", status, text);
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse health response")?;

        match body.get("status").and_then(Value::as_str) {
            Some("healthy") => Ok(()),
            other => anyhow::bail!("Matching service reports status {:?}", other),
        }
    }
}

/// Decode a success body.
///
/// The body must be a JSON object. A missing or `null` `matches` field means
/// no matches; a `matches` field of any other non-array type is undecodable.
pub fn decode_match_response(body: &[u8]) -> std::result::Result<MatchResponse, MatchError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| MatchError::Undecodable {
        detail: e.to_string(),
    })?;

    let Value::Object(mut object) = value else {
        return Err(MatchError::Undecodable {
            detail: "response body is not a JSON object".to_string(),
        });
    };

    let matches = match object.remove("matches") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.into_iter().map(Match::new).collect(),
        Some(other) => {
            return Err(MatchError::Undecodable {
                detail: format!("`matches` is not an array: {}", other),
            })
        }
    };

    Ok(MatchResponse {
        matches,
        processing_time_ms: object.get("processing_time_ms").and_then(Value::as_f64),
        confidence_threshold: object.get("confidence_threshold").and_then(Value::as_f64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_url() {
        let service = HttpMatchService::new("http://localhost:8000/");
        assert_eq!(service.api_url(MATCH_PATH), "http://localhost:8000/api/match");
        assert_eq!(service.api_url(HEALTH_PATH), "http://localhost:8000/api/health");
    }

    #[test]
    fn test_decode_full_match_result() {
        let body = json!({
            "matches": [
                {"track_id": 1, "title": "A", "artist": "X", "confidence": 0.91, "duration": 201.0, "url": "https://soundcloud.com/x/a"},
                {"track_id": 2, "title": "B", "artist": "Y", "confidence": 0.74, "duration": 180.5, "url": "https://soundcloud.com/y/b"}
            ],
            "processing_time_ms": 12.5,
            "confidence_threshold": 0.7
        });

        let decoded = decode_match_response(body.to_string().as_bytes()).unwrap();
        assert_eq!(decoded.matches.len(), 2);
        assert_eq!(decoded.matches[0].title(), Some("A"));
        assert_eq!(decoded.matches[1].title(), Some("B"));
        assert_eq!(decoded.processing_time_ms, Some(12.5));
        assert_eq!(decoded.confidence_threshold, Some(0.7));
    }

    #[test]
    fn test_decode_missing_matches_is_empty() {
        let decoded = decode_match_response(b"{}").unwrap();
        assert!(decoded.matches.is_empty());
        assert_eq!(decoded.processing_time_ms, None);
    }

    #[test]
    fn test_decode_null_matches_is_empty() {
        let decoded = decode_match_response(br#"{"matches": null}"#).unwrap();
        assert!(decoded.matches.is_empty());
    }

    #[test]
    fn test_decode_invalid_json_fails() {
        let err = decode_match_response(b"<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, MatchError::Undecodable { .. }));
        assert_eq!(err.message(), "Matching failed");
    }

    #[test]
    fn test_decode_non_object_fails() {
        assert!(decode_match_response(b"null").is_err());
        assert!(decode_match_response(b"[1, 2]").is_err());
    }

    #[test]
    fn test_decode_non_array_matches_fails() {
        let err = decode_match_response(br#"{"matches": 5}"#).unwrap_err();
        assert!(matches!(err, MatchError::Undecodable { .. }));
    }

    #[test]
    fn test_service_name() {
        let service = HttpMatchService::new("http://localhost:8000");
        assert_eq!(service.name(), "http");
        assert_eq!(service.base_url(), "http://localhost:8000");
    }
}
