//! Clip ingestion.
//!
//! Capture sources that hand finished recordings to the controller:
//!
//! ```text
//! clips dir → Watcher → ClipEvent → Controller::on_recording_complete
//! ```

pub mod watcher;

pub use watcher::{ClipEvent, ClipWatcher, WatchHandle, WatcherConfig, WatcherError};
