//! Adapter interfaces for the matching service.
//!
//! The controller only talks to a [`MatchService`]; the HTTP client is one
//! implementation, tests supply scripted ones.

pub mod http;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{AudioClip, Match};

// Re-export the HTTP adapter
pub use http::{decode_match_response, HttpMatchService, MatchResponse, HEALTH_PATH, MATCH_PATH};

/// Fixed message for every failure that has no transport detail
pub const MATCHING_FAILED: &str = "Matching failed";

/// Ways a match request can fail.
///
/// Only transport failures surface their own message; everything else reads
/// as the generic [`MATCHING_FAILED`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// Service answered with a non-success status
    #[error("Matching failed")]
    Rejected { status: u16 },

    /// Service answered 2xx but the body could not be decoded
    #[error("Matching failed")]
    Undecodable { detail: String },

    /// Request never completed
    #[error("{0}")]
    Transport(String),
}

impl MatchError {
    /// The text stored in the session and shown to the user
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Result of one submission
pub type MatchOutcome = std::result::Result<Vec<Match>, MatchError>;

/// Trait for matching backends
#[async_trait]
pub trait MatchService: Send + Sync {
    /// Human-readable service name
    fn name(&self) -> &str;

    /// Submit one clip. Exactly one outbound request per call.
    async fn submit(&self, clip: &AudioClip) -> MatchOutcome;

    /// Health check
    async fn health_check(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_failures_share_one_message() {
        assert_eq!(MatchError::Rejected { status: 500 }.message(), MATCHING_FAILED);
        assert_eq!(
            MatchError::Undecodable {
                detail: "expected value at line 1".to_string()
            }
            .message(),
            MATCHING_FAILED
        );
    }

    #[test]
    fn test_transport_failure_passes_message_through() {
        let err = MatchError::Transport("network down".to_string());
        assert_eq!(err.message(), "network down");
    }
}
