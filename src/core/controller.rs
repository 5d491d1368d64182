//! Request lifecycle controller.
//!
//! Owns the [`Session`] and mediates between a capture source and a
//! [`MatchService`]. Transitions are applied as whole-value replacements
//! through [`Session::apply`]; observers follow along through a `watch`
//! channel.

use std::time::Instant;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::adapters::{MatchOutcome, MatchService};
use crate::domain::{AudioClip, FeedbackEvent, Session, TrackId, Transition, Verdict};

/// Capacity of the feedback broadcast channel
const FEEDBACK_CHANNEL_CAPACITY: usize = 64;

/// Controller for the recording → processing → settled cycle
pub struct Controller<S> {
    /// Matching backend
    service: S,
    /// Current session, published to subscribers
    session: watch::Sender<Session>,
    /// Outbound feedback events
    feedback_tx: broadcast::Sender<FeedbackEvent>,
}

impl<S: MatchService> Controller<S> {
    /// Create a controller with a fresh session
    pub fn new(service: S) -> Self {
        let (session, _) = watch::channel(Session::default());
        let (feedback_tx, _) = broadcast::channel(FEEDBACK_CHANNEL_CAPACITY);

        Self {
            service,
            session,
            feedback_tx,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    /// Follow session changes
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    /// Follow feedback events
    pub fn subscribe_feedback(&self) -> broadcast::Receiver<FeedbackEvent> {
        self.feedback_tx.subscribe()
    }

    /// Capture source reported that recording started or stopped
    pub fn on_recording_changed(&self, active: bool) {
        debug!(active, "recording state changed");
        self.apply(Transition::RecordingChanged(active));
    }

    /// Capture source delivered a finished clip
    pub async fn on_recording_complete(&self, clip: AudioClip) -> MatchOutcome {
        self.submit_recording(clip).await
    }

    /// Submit a clip for matching and settle the session with the result.
    ///
    /// Overlapping calls are allowed; the last one to settle wins.
    pub async fn submit_recording(&self, clip: AudioClip) -> MatchOutcome {
        if self.session.borrow().processing {
            warn!("submitting a new clip while a previous request is still processing");
        }

        self.apply(Transition::Submitted);
        info!(
            service = self.service.name(),
            bytes = clip.len(),
            digest = %clip.digest(),
            "submitting clip for matching"
        );

        let started = Instant::now();
        let outcome = self.service.submit(&clip).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(matches) => {
                info!(matches = matches.len(), duration_ms, "matching succeeded");
                self.apply(Transition::Succeeded(matches.clone()));
            }
            Err(e) => {
                warn!(error = ?e, duration_ms, "matching failed");
                self.apply(Transition::Failed(e.message()));
            }
        }

        outcome
    }

    /// Record the user's judgment of a match. Fire-and-forget.
    pub fn record_feedback(&self, track_id: TrackId, is_correct: bool) {
        let event = FeedbackEvent::new(track_id, Verdict::from_bool(is_correct));
        info!("{}", event);
        // nobody listening is fine
        let _ = self.feedback_tx.send(event);
    }

    fn apply(&self, transition: Transition) {
        self.session.send_modify(|session| {
            let from = session.phase();
            *session = std::mem::take(session).apply(transition);
            let to = session.phase();
            if from != to {
                info!(from = %from, to = %to, "session transition");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::adapters::MatchError;
    use crate::domain::{Match, Phase, Settlement};

    struct FixedService(MatchOutcome);

    #[async_trait]
    impl MatchService for FixedService {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn submit(&self, _clip: &AudioClip) -> MatchOutcome {
            self.0.clone()
        }

        async fn health_check(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_initial_state() {
        let controller = Controller::new(FixedService(Ok(Vec::new())));
        assert_eq!(controller.session(), Session::default());
        assert_eq!(controller.session().phase(), Phase::Idle);
    }

    #[test]
    fn test_recording_flag_follows_capture() {
        let controller = Controller::new(FixedService(Ok(Vec::new())));

        controller.on_recording_changed(true);
        assert!(controller.session().recording_active);

        controller.on_recording_changed(false);
        assert!(!controller.session().recording_active);
    }

    #[tokio::test]
    async fn test_submit_settles_success() {
        let matches = vec![Match::new(json!({"trackId": "t1"}))];
        let controller = Controller::new(FixedService(Ok(matches.clone())));

        let outcome = controller.submit_recording(AudioClip::wav(b"x".to_vec())).await;
        assert_eq!(outcome, Ok(matches.clone()));

        let session = controller.session();
        assert_eq!(session.matches, matches);
        assert_eq!(session.phase(), Phase::Settled(Settlement::Success));
    }

    #[tokio::test]
    async fn test_submit_settles_failure() {
        let controller = Controller::new(FixedService(Err(MatchError::Rejected { status: 400 })));

        let outcome = controller.on_recording_complete(AudioClip::wav(b"x".to_vec())).await;
        assert!(outcome.is_err());
        assert_eq!(controller.session().error.as_deref(), Some("Matching failed"));
    }

    #[tokio::test]
    async fn test_feedback_is_broadcast() {
        let controller = Controller::new(FixedService(Ok(Vec::new())));
        let mut rx = controller.subscribe_feedback();

        controller.record_feedback(TrackId::from("t1"), true);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.track_id, TrackId::from("t1"));
        assert_eq!(event.verdict, Verdict::Correct);
    }

    #[test]
    fn test_feedback_without_subscribers_is_ignored() {
        let controller = Controller::new(FixedService(Ok(Vec::new())));
        controller.record_feedback(TrackId::from("t1"), false);
        assert_eq!(controller.session(), Session::default());
    }
}
