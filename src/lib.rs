//! soundscout - client for the SoundScout audio matching service
//!
//! Records (or picks up) an audio clip, posts it to the matching service and
//! keeps a small session describing the interaction: whether a clip is being
//! captured, whether a request is in flight, the last matches and the last
//! error.
//!
//! # Architecture
//!
//! The session moves through a cyclic lifecycle:
//! - Idle → Recording → Processing → Settled(Success | Failure)
//! - From Settled a new recording can begin at any time
//!
//! # Modules
//!
//! - `adapters`: Matching service integrations (HTTP)
//! - `core`: Lifecycle controller
//! - `domain`: Data structures (Session, Match, AudioClip, FeedbackEvent)
//! - `ingest`: Capture sources (clip directory watcher)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Match a single clip
//! soundscout match clip.wav
//!
//! # Submit every clip dropped into a directory
//! soundscout watch --path ./clips
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;

// Re-export main types at crate root for convenience
pub use crate::adapters::{HttpMatchService, MatchError, MatchOutcome, MatchService};
pub use crate::core::Controller;
pub use crate::domain::{AudioClip, FeedbackEvent, Match, Phase, Session, Settlement, TrackId};
pub use crate::ingest::{ClipEvent, ClipWatcher, WatcherConfig};
