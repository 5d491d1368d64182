//! Outbound events emitted by the controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::matches::TrackId;

/// The user's judgment of a suggested match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    pub fn from_bool(is_correct: bool) -> Self {
        if is_correct {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Correct => write!(f, "correct"),
            Verdict::Incorrect => write!(f, "incorrect"),
        }
    }
}

/// Fire-and-forget feedback about one match.
///
/// Nothing persists these; they exist for observers and logs only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    /// Unique identifier for this event
    pub id: Uuid,

    /// Track the feedback is about
    pub track_id: TrackId,

    pub verdict: Verdict,

    /// When the feedback was given
    pub recorded_at: DateTime<Utc>,
}

impl FeedbackEvent {
    pub fn new(track_id: TrackId, verdict: Verdict) -> Self {
        Self {
            id: Uuid::new_v4(),
            track_id,
            verdict,
            recorded_at: Utc::now(),
        }
    }
}

impl std::fmt::Display for FeedbackEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Feedback for track {}: {}", self.track_id, self.verdict)
    }
}
