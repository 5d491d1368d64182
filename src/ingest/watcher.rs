//! Clip directory watcher.
//!
//! Watches a directory for recorded clips and emits an event once each file
//! has stopped growing. Acts as a capture source for the controller.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::clip::digest_bytes;

/// Errors that can occur with the watcher
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Watch directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for the watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Directory to watch
    pub watch_path: PathBuf,

    /// How long a file must be stable before it is emitted (seconds)
    pub stability_delay_secs: u64,

    /// File extensions to watch
    pub extensions: Vec<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            watch_path: Self::default_clips_path(),
            stability_delay_secs: 2,
            extensions: vec!["wav".to_string()],
        }
    }
}

impl WatcherConfig {
    /// Default clip directory (~/.soundscout/clips)
    pub fn default_clips_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("~"))
            .join(".soundscout")
            .join("clips")
    }

    /// Check if the watch path exists
    pub fn validate(&self) -> Result<(), WatcherError> {
        if !self.watch_path.is_dir() {
            return Err(WatcherError::DirectoryNotFound(self.watch_path.clone()));
        }
        Ok(())
    }

    /// Check if a path has one of the watched extensions
    pub fn is_clip(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

/// Emitted when a clip is detected and stable
#[derive(Debug, Clone)]
pub struct ClipEvent {
    /// Path to the clip
    pub path: PathBuf,

    /// SHA256 digest (12 chars)
    pub digest: String,

    /// File size in bytes
    pub size: u64,

    /// When the clip was detected
    pub detected_at: DateTime<Utc>,
}

/// Watches a directory for finished clips
pub struct ClipWatcher {
    config: WatcherConfig,
}

impl ClipWatcher {
    /// Create a new watcher with default configuration
    pub fn new() -> Self {
        Self {
            config: WatcherConfig::default(),
        }
    }

    /// Create a watcher with custom configuration
    pub fn with_config(config: WatcherConfig) -> Self {
        Self { config }
    }

    /// Get the current configuration
    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// List clips already present, sorted by path
    pub async fn scan_once(&self) -> Result<Vec<PathBuf>, WatcherError> {
        self.config.validate()?;

        let mut clips = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.config.watch_path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !self.config.is_clip(&path) {
                continue;
            }

            match tokio::fs::metadata(&path).await {
                Ok(metadata) if metadata.is_file() => clips.push(path),
                _ => continue,
            }
        }

        clips.sort();
        Ok(clips)
    }

    /// Watch the directory and emit events for new stable clips.
    /// Runs until stopped through the returned handle.
    pub async fn watch(&self) -> Result<(mpsc::Receiver<ClipEvent>, WatchHandle), WatcherError> {
        self.config.validate()?;

        let (event_tx, event_rx) = mpsc::channel::<ClipEvent>(100);
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

        let config = self.config.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = run_watcher(config, event_tx, &mut stop_rx).await {
                tracing::error!("Watcher error: {}", e);
            }
        });

        Ok((
            event_rx,
            WatchHandle {
                stop_tx,
                task: handle,
            },
        ))
    }
}

impl Default for ClipWatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to control the watcher
pub struct WatchHandle {
    stop_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl WatchHandle {
    /// Stop the watcher
    pub async fn stop(self) -> Result<()> {
        let _ = self.stop_tx.send(()).await;
        self.task.await?;
        Ok(())
    }
}

/// Internal watcher loop
async fn run_watcher(
    config: WatcherConfig,
    event_tx: mpsc::Sender<ClipEvent>,
    stop_rx: &mut mpsc::Receiver<()>,
) -> Result<(), WatcherError> {
    // path -> (size, last_seen) for files still settling
    let mut pending: HashMap<PathBuf, (u64, Instant)> = HashMap::new();
    // path -> digest of the last emitted content
    let mut emitted: HashMap<PathBuf, String> = HashMap::new();

    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;
    debouncer
        .watcher()
        .watch(&config.watch_path, RecursiveMode::NonRecursive)?;

    let stability_delay = Duration::from_secs(config.stability_delay_secs);

    tracing::info!("Watching {} for clips", config.watch_path.display());

    loop {
        if stop_rx.try_recv().is_ok() {
            tracing::info!("Watcher stopping...");
            break;
        }

        match rx.recv_timeout(Duration::from_millis(250)) {
            Ok(Ok(events)) => {
                for event in events {
                    if !config.is_clip(&event.path) {
                        continue;
                    }
                    match std::fs::metadata(&event.path) {
                        Ok(metadata) if metadata.is_file() => {
                            pending.insert(event.path, (metadata.len(), Instant::now()));
                        }
                        Ok(_) => {}
                        Err(_) => {
                            // deleted: a later clip at this path is new again
                            pending.remove(&event.path);
                            emitted.remove(&event.path);
                        }
                    }
                }
            }
            Ok(Err(e)) => {
                tracing::warn!("Watcher error: {:?}", e);
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("Watcher channel disconnected");
                break;
            }
        }

        let now = Instant::now();
        let mut stable = Vec::new();
        let mut dropped = Vec::new();

        for (path, (last_size, last_seen)) in pending.iter_mut() {
            if now.duration_since(*last_seen) < stability_delay {
                continue;
            }
            let current = std::fs::metadata(path).ok().map(|m| m.len());
            match check_size(*last_size, current) {
                SizeCheck::Stable => stable.push((path.clone(), *last_size)),
                SizeCheck::Growing(size) => {
                    *last_size = size;
                    *last_seen = now;
                }
                SizeCheck::Empty => dropped.push((path.clone(), false)),
                SizeCheck::Gone => dropped.push((path.clone(), true)),
            }
        }

        for (path, gone) in dropped {
            pending.remove(&path);
            if gone {
                emitted.remove(&path);
            }
        }

        for (path, size) in stable {
            pending.remove(&path);

            let content = match tokio::fs::read(&path).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                    continue;
                }
            };
            let digest = digest_bytes(&content);

            if emitted.get(&path) == Some(&digest) {
                tracing::debug!("Clip unchanged, skipping: {}", path.display());
                continue;
            }
            emitted.insert(path.clone(), digest.clone());

            tracing::info!("New clip detected: {} ({})", path.display(), digest);
            let event = ClipEvent {
                path,
                digest,
                size,
                detected_at: Utc::now(),
            };
            if event_tx.send(event).await.is_err() {
                // receiver gone, nobody to hand clips to
                return Ok(());
            }
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    Ok(())
}

/// Outcome of re-checking a pending file once the stability delay has passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SizeCheck {
    /// Same non-zero size as last time
    Stable,
    /// Size changed; keep waiting
    Growing(u64),
    /// Still zero bytes; stop tracking until it is written again
    Empty,
    /// File no longer exists
    Gone,
}

fn check_size(last_size: u64, current: Option<u64>) -> SizeCheck {
    match current {
        None => SizeCheck::Gone,
        Some(size) if size != last_size => SizeCheck::Growing(size),
        Some(0) => SizeCheck::Empty,
        Some(_) => SizeCheck::Stable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_clips_path() {
        let path = WatcherConfig::default_clips_path();
        assert!(path.to_string_lossy().contains(".soundscout"));
    }

    #[test]
    fn test_is_clip_ignores_case() {
        let config = WatcherConfig::default();
        assert!(config.is_clip(Path::new("/tmp/a.wav")));
        assert!(config.is_clip(Path::new("/tmp/B.WAV")));
        assert!(!config.is_clip(Path::new("/tmp/notes.txt")));
        assert!(!config.is_clip(Path::new("/tmp/wav")));
    }

    #[tokio::test]
    async fn test_scan_once() {
        let temp = TempDir::new().unwrap();

        tokio::fs::write(temp.path().join("b.wav"), b"clip b").await.unwrap();
        tokio::fs::write(temp.path().join("a.wav"), b"clip a").await.unwrap();
        tokio::fs::write(temp.path().join("readme.txt"), b"not audio").await.unwrap();
        tokio::fs::create_dir(temp.path().join("dir.wav")).await.unwrap();

        let watcher = ClipWatcher::with_config(WatcherConfig {
            watch_path: temp.path().to_path_buf(),
            stability_delay_secs: 1,
            extensions: vec!["wav".to_string()],
        });

        let clips = watcher.scan_once().await.unwrap();
        assert_eq!(
            clips,
            vec![temp.path().join("a.wav"), temp.path().join("b.wav")]
        );
    }

    #[test]
    fn test_check_size() {
        assert_eq!(check_size(10, Some(10)), SizeCheck::Stable);
        assert_eq!(check_size(10, Some(25)), SizeCheck::Growing(25));
        assert_eq!(check_size(0, Some(4)), SizeCheck::Growing(4));
        assert_eq!(check_size(0, Some(0)), SizeCheck::Empty);
        assert_eq!(check_size(10, None), SizeCheck::Gone);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_watch_emits_stable_clip_once() {
        let temp = TempDir::new().unwrap();
        let watcher = ClipWatcher::with_config(WatcherConfig {
            watch_path: temp.path().to_path_buf(),
            stability_delay_secs: 1,
            extensions: vec!["wav".to_string()],
        });

        let (mut events, handle) = watcher.watch().await.unwrap();
        // give the OS watcher a moment to register
        tokio::time::sleep(Duration::from_millis(300)).await;

        let clip_path = temp.path().join("a.wav");
        tokio::fs::write(&clip_path, b"abc").await.unwrap();
        tokio::fs::write(temp.path().join("empty.wav"), b"").await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
            .await
            .expect("no clip event within 10s")
            .expect("watcher channel closed");
        assert_eq!(event.path.file_name(), clip_path.file_name());
        assert_eq!(event.size, 3);
        assert_eq!(event.digest, digest_bytes(b"abc"));

        // same bytes again: nothing new, and the empty clip never settles
        tokio::fs::write(&clip_path, b"abc").await.unwrap();
        let second = tokio::time::timeout(Duration::from_secs(4), events.recv()).await;
        assert!(second.is_err(), "unexpected event: {:?}", second);

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_directory_is_rejected() {
        let temp = TempDir::new().unwrap();
        let watcher = ClipWatcher::with_config(WatcherConfig {
            watch_path: temp.path().join("missing"),
            ..Default::default()
        });

        let err = watcher.scan_once().await.unwrap_err();
        assert!(matches!(err, WatcherError::DirectoryNotFound(_)));
    }
}
