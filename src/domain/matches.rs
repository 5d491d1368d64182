//! Match records returned by the matching service.
//!
//! The service owns the shape of a match. We keep each record as the raw
//! JSON value it arrived as, so identity and ordering survive untouched, and
//! only offer lenient read accessors for rendering.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a candidate track.
///
/// Services disagree on whether this is a string or an integer, so it is
/// normalised to its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TrackId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One candidate track, passed through from the service unvalidated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Match(Value);

impl Match {
    /// Wrap a raw record
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// The record exactly as the service sent it
    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn into_raw(self) -> Value {
        self.0
    }

    /// Track identifier, read from `trackId` or `track_id`
    pub fn track_id(&self) -> Option<TrackId> {
        let value = self.0.get("trackId").or_else(|| self.0.get("track_id"))?;
        match value {
            Value::String(s) => Some(TrackId(s.clone())),
            Value::Number(n) => Some(TrackId(n.to_string())),
            _ => None,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(Value::as_str)
    }

    pub fn artist(&self) -> Option<&str> {
        self.0.get("artist").and_then(Value::as_str)
    }

    /// Confidence in `0.0..=1.0` when the service reports one
    pub fn confidence(&self) -> Option<f64> {
        self.0.get("confidence").and_then(Value::as_f64)
    }

    pub fn url(&self) -> Option<&str> {
        self.0.get("url").and_then(Value::as_str)
    }
}

impl From<Value> for Match {
    fn from(raw: Value) -> Self {
        Self(raw)
    }
}
