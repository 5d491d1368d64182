//! Domain types for the soundscout client.
//!
//! This module contains the core data structures:
//! - Session: Interaction state and its pure transitions
//! - Match: Opaque candidate tracks returned by the service
//! - AudioClip: Recorded payloads handed to the controller
//! - Events: Outbound feedback messages

pub mod clip;
pub mod events;
pub mod matches;
pub mod session;

// Re-export commonly used types
pub use clip::{AudioClip, AudioFormat};
pub use events::{FeedbackEvent, Verdict};
pub use matches::{Match, TrackId};
pub use session::{Phase, Session, Settlement, Transition};
