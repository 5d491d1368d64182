//! Session state for the recording-to-result lifecycle.
//!
//! A `Session` is only ever replaced, never mutated in place: each
//! `Transition` produces the next value through [`Session::apply`].

use serde::{Deserialize, Serialize};

use super::matches::Match;

/// How the most recent request settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    Success,
    Failure,
}

/// Observable phase of the lifecycle, derived from a `Session`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing recorded yet
    Idle,
    /// Capture in progress
    Recording,
    /// A match request is in flight
    Processing,
    /// Last request finished; a new recording may start at any time
    Settled(Settlement),
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "Idle"),
            Phase::Recording => write!(f, "Recording"),
            Phase::Processing => write!(f, "Processing"),
            Phase::Settled(Settlement::Success) => write!(f, "Settled(Success)"),
            Phase::Settled(Settlement::Failure) => write!(f, "Settled(Failure)"),
        }
    }
}

/// Events that move the session forward
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Capture source reported recording started or stopped
    RecordingChanged(bool),

    /// A completed clip was handed over and a request issued
    Submitted,

    /// Request resolved with a decodable success body
    Succeeded(Vec<Match>),

    /// Request failed; carries the user-facing message
    Failed(String),
}

/// The interaction state shown to the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Whether capture is currently in progress
    pub recording_active: bool,

    /// Whether a match request is in flight
    pub processing: bool,

    /// Results of the last successful request (empty = nothing to show)
    pub matches: Vec<Match>,

    /// Message of the last failed request
    pub error: Option<String>,

    /// Outcome of the last settled request, cleared on submission
    pub settled: Option<Settlement>,
}

impl Session {
    /// Compute the session that follows `transition`
    pub fn apply(self, transition: Transition) -> Session {
        match transition {
            Transition::RecordingChanged(active) => Session {
                recording_active: active,
                ..self
            },
            Transition::Submitted => Session {
                processing: true,
                error: None,
                settled: None,
                ..self
            },
            Transition::Succeeded(matches) => Session {
                processing: false,
                matches,
                error: None,
                settled: Some(Settlement::Success),
                ..self
            },
            Transition::Failed(message) => Session {
                processing: false,
                matches: Vec::new(),
                error: Some(message),
                settled: Some(Settlement::Failure),
                ..self
            },
        }
    }

    /// Current phase. An active capture wins over an in-flight request.
    pub fn phase(&self) -> Phase {
        if self.recording_active {
            Phase::Recording
        } else if self.processing {
            Phase::Processing
        } else if let Some(settlement) = self.settled {
            Phase::Settled(settlement)
        } else {
            Phase::Idle
        }
    }

    /// Whether there are results worth rendering
    pub fn has_results(&self) -> bool {
        !self.matches.is_empty()
    }
}
