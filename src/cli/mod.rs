//! Command-line interface for soundscout.
//!
//! Provides commands for matching a single clip, watching a directory of
//! clips, sending feedback, and checking the matching service.

use std::future::Future;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::adapters::{HttpMatchService, MatchService, MATCH_PATH};
use crate::config;
use crate::core::Controller;
use crate::domain::{AudioClip, Match, TrackId, Verdict};
use crate::ingest::ClipWatcher;

pub mod render;

/// soundscout - identify tracks from recorded audio clips
#[derive(Parser, Debug)]
#[command(name = "soundscout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Matching service base URL (overrides SOUNDSCOUT_URL and config file)
    #[arg(long, global = true)]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit one clip and show the matches
    Match {
        /// Audio clip to submit (uploaded as recording.wav)
        file: PathBuf,

        /// Ask for feedback on each match afterwards
        #[arg(short, long)]
        review: bool,
    },

    /// Watch a directory and submit each new clip
    Watch {
        /// Directory to watch (defaults to the configured clip directory)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Submit clips already in the directory and exit
        #[arg(long)]
        once: bool,
    },

    /// Record whether a suggested track was right
    Feedback {
        /// Track ID as shown in match results
        track_id: String,

        /// Your verdict
        #[arg(value_enum)]
        verdict: VerdictArg,
    },

    /// Check that the matching service is up
    Health,

    /// Show resolved configuration (debug)
    Config,
}

/// Verdict for CLI (maps to `is_correct`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VerdictArg {
    /// The match was right
    Correct,

    /// The match was wrong
    Incorrect,
}

impl From<VerdictArg> for bool {
    fn from(v: VerdictArg) -> Self {
        matches!(v, VerdictArg::Correct)
    }
}

impl From<VerdictArg> for Verdict {
    fn from(v: VerdictArg) -> Self {
        Verdict::from_bool(v.into())
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let url = self.url;
        match self.command {
            Commands::Match { file, review } => {
                match_clip(&service_url(url)?, &file, review).await
            }
            Commands::Watch { path, once } => {
                watch_clips(&service_url(url)?, path, once).await
            }
            Commands::Feedback { track_id, verdict } => {
                // log-only: no config lookup, no network
                send_feedback(url.as_deref(), track_id, verdict)
            }
            Commands::Health => {
                check_health(&service_url(url)?).await
            }
            Commands::Config => {
                show_config(url)
            }
        }
    }
}

/// Flag value, or the configured URL
fn service_url(flag: Option<String>) -> Result<String> {
    match flag {
        Some(url) => Ok(url),
        None => Ok(config::config()?.service_url.clone()),
    }
}

/// Submit a single clip file
async fn match_clip(service_url: &str, path: &Path, review: bool) -> Result<()> {
    let controller = Controller::new(HttpMatchService::new(service_url));

    // reading the file stands in for capture
    controller.on_recording_changed(true);
    let clip = AudioClip::from_path(path)
        .await
        .with_context(|| format!("Failed to read clip: {}", path.display()));
    controller.on_recording_changed(false);
    let clip = clip?;

    let outcome = controller.on_recording_complete(clip).await;
    print!("{}", render::render_session(&controller.session()));

    match outcome {
        Ok(matches) => {
            if review {
                review_matches(&controller, &matches)?;
            }
            Ok(())
        }
        Err(_) => std::process::exit(1),
    }
}

/// Ask y/n/s for each identifiable match and record the answers
fn review_matches<S: MatchService>(controller: &Controller<S>, matches: &[Match]) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock();

    for m in matches {
        let Some(track_id) = m.track_id() else {
            continue;
        };

        print!("Was \"{}\" correct? [y/n/s] ", render::describe(m));
        io::stdout().flush()?;

        let mut answer = String::new();
        if lines.read_line(&mut answer).context("Failed to read answer")? == 0 {
            break;
        }

        if let Some(is_correct) = parse_answer(&answer) {
            controller.record_feedback(track_id, is_correct);
        }
    }

    Ok(())
}

/// `Some(true)` for yes, `Some(false)` for no, `None` to skip
fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Watch a clip directory (or drain it with --once)
async fn watch_clips(service_url: &str, path: Option<PathBuf>, once: bool) -> Result<()> {
    let mut watch_config = config::config()?.watch.clone();
    if let Some(path) = path {
        watch_config.watch_path = path;
    }

    let watcher = ClipWatcher::with_config(watch_config);
    let watch_path = watcher.config().watch_path.clone();
    let controller = Arc::new(Controller::new(HttpMatchService::new(service_url)));

    if once {
        let clips = watcher
            .scan_once()
            .await
            .with_context(|| format!("Failed to scan {}", watch_path.display()))?;

        if clips.is_empty() {
            println!("No clips found in {}", watch_path.display());
            return Ok(());
        }

        for clip_path in clips {
            capture_and_submit(controller.as_ref(), &clip_path).await;
        }
        return Ok(());
    }

    let (mut events, handle) = watcher
        .watch()
        .await
        .with_context(|| format!("Failed to watch {}", watch_path.display()))?;

    println!("Watching {} (Ctrl-C to stop)", watch_path.display());

    let mut submissions = JoinSet::new();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                let controller = Arc::clone(&controller);
                // no guard against overlap: each clip gets its own request
                submissions.spawn(async move {
                    capture_and_submit(controller.as_ref(), &event.path).await;
                });
            }
            Some(joined) = submissions.join_next(), if !submissions.is_empty() => {
                if let Err(e) = joined {
                    warn!("Submission task failed: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
        }
    }

    handle.stop().await?;

    if !submissions.is_empty() {
        println!(
            "Waiting for {} in-flight submission(s) (Ctrl-C again to abandon)",
            submissions.len()
        );
    }
    let abandoned = drain_submissions(&mut submissions, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await;
    if abandoned > 0 {
        warn!(abandoned, "abandoned in-flight submissions");
    }

    Ok(())
}

/// Wait for every submission to finish, or abort the rest once `interrupt`
/// resolves. Returns how many were abandoned.
async fn drain_submissions<F>(submissions: &mut JoinSet<()>, interrupt: F) -> usize
where
    F: Future<Output = ()>,
{
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            joined = submissions.join_next() => match joined {
                Some(Ok(())) => {}
                Some(Err(e)) => warn!("Submission task failed: {}", e),
                None => return 0,
            },
            _ = &mut interrupt => {
                let abandoned = submissions.len();
                submissions.abort_all();
                return abandoned;
            }
        }
    }
}

/// Feed one clip file through the controller and print the outcome
async fn capture_and_submit<S: MatchService>(controller: &Controller<S>, path: &Path) {
    controller.on_recording_changed(true);
    let clip = AudioClip::from_path(path).await;
    controller.on_recording_changed(false);

    let clip = match clip {
        Ok(clip) => clip,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return;
        }
    };

    let outcome = controller.on_recording_complete(clip).await;

    println!();
    println!("== {}", path.display());
    match outcome {
        Ok(matches) if matches.is_empty() => println!("No matches found"),
        Ok(matches) => print!("{}", render::render_matches(&matches)),
        Err(e) => println!("Error: {}", e.message()),
    }
}

/// Send feedback about a track
fn send_feedback(url_flag: Option<&str>, track_id: String, verdict: VerdictArg) -> Result<()> {
    // never contacted; feedback only goes to observers and logs
    let service_url = url_flag.unwrap_or(config::DEFAULT_SERVICE_URL);
    let controller = Controller::new(HttpMatchService::new(service_url));
    let track_id = TrackId::from(track_id);

    controller.record_feedback(track_id.clone(), verdict.into());
    println!("{}", feedback_confirmation(&track_id, verdict));

    Ok(())
}

fn feedback_confirmation(track_id: &TrackId, verdict: VerdictArg) -> String {
    format!("Recorded: track {} is {}", track_id, Verdict::from(verdict))
}

/// Check matching service health
async fn check_health(service_url: &str) -> Result<()> {
    let service = HttpMatchService::new(service_url);
    service.health_check().await?;
    println!("Matching service at {} is healthy", service_url);
    Ok(())
}

/// Show resolved configuration
fn show_config(url_flag: Option<String>) -> Result<()> {
    let cfg = config::config()?;

    println!();
    println!("SoundScout Configuration");
    println!("══════════════════════════════════════════════════════════════");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Service:");
    println!("  Base URL:  {}", url_flag.as_deref().unwrap_or(cfg.service_url.as_str()));
    println!("  Endpoint:  {}", MATCH_PATH);
    println!();
    println!("Watch:");
    println!("  Path:             {}", cfg.watch.watch_path.display());
    println!("  Stability delay:  {}s", cfg.watch.stability_delay_secs);
    println!("  Extensions:       {}", cfg.watch.extensions.join(", "));

    Ok(())
}
