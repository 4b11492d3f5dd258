//! Event bridge: engine notifications -> queue and engine state.
//!
//! Runs as a single background task draining the backend's notification
//! channel. End-of-file advances the queue; start-of-file completes a
//! pending replacement. After every handled notification the bridge
//! re-reads position, duration and volume and publishes a fresh status.
//! Property changes already queued behind one being handled are folded
//! into that single refresh.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use soniq_api::SubsonicClient;

use crate::engine::{DiagnosticLevel, EndReason, EnginePhase, Notification, PlaybackEngine};

/// Receives "now playing" and "played" reports.
#[async_trait]
pub trait Scrobbler: Send + Sync {
    async fn now_playing(&self, entity_id: &str);
    async fn played(&self, entity_id: &str);
}

#[async_trait]
impl Scrobbler for SubsonicClient {
    async fn now_playing(&self, entity_id: &str) {
        if let Err(e) = self.scrobble(entity_id, false).await {
            debug!(entity_id, error = %e, "now-playing scrobble failed");
        }
    }

    async fn played(&self, entity_id: &str) {
        if let Err(e) = self.scrobble(entity_id, true).await {
            debug!(entity_id, error = %e, "play scrobble failed");
        }
    }
}

/// What the loop should do after a notification.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    /// Handled; refresh status.
    Refresh,
    /// Ignored entirely.
    Skip,
    Exit,
}

/// Drain `notifications` until shutdown, the channel closes, or `cancel`
/// fires.
pub async fn run_event_bridge(
    engine: Arc<PlaybackEngine>,
    mut notifications: mpsc::UnboundedReceiver<Notification>,
    scrobbler: Option<Arc<dyn Scrobbler>>,
    cancel: CancellationToken,
) {
    debug!("event bridge started");
    let mut held = None;
    loop {
        if cancel.is_cancelled() {
            break;
        }
        let notification = match held.take() {
            Some(n) => n,
            None => tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                next = notifications.recv() => match next {
                    Some(n) => n,
                    None => break,
                },
            },
        };

        if matches!(notification, Notification::PropertyChange { .. }) {
            let (folded, next) = drain_property_changes(&mut notifications);
            if folded > 0 {
                trace!(folded, "property changes folded into one refresh");
            }
            held = next;
        }

        match handle(&engine, scrobbler.as_deref(), notification).await {
            Step::Exit => break,
            Step::Skip => {}
            Step::Refresh => {
                engine.refresh_status().await;
            }
        }
    }
    info!("event bridge stopped");
}

/// Take the property changes queued right now. Returns how many were
/// taken and the first other notification, which must still be handled.
fn drain_property_changes(
    notifications: &mut mpsc::UnboundedReceiver<Notification>,
) -> (usize, Option<Notification>) {
    let mut folded = 0;
    while let Ok(next) = notifications.try_recv() {
        if !matches!(next, Notification::PropertyChange { .. }) {
            return (folded, Some(next));
        }
        folded += 1;
    }
    (folded, None)
}

async fn handle(
    engine: &PlaybackEngine,
    scrobbler: Option<&dyn Scrobbler>,
    notification: Notification,
) -> Step {
    match notification {
        Notification::EndFile { reason } => {
            if engine.phase() == EnginePhase::Replacing {
                debug!(%reason, "end-file during replacement ignored");
                return Step::Refresh;
            }
            on_end_file(engine, scrobbler, reason).await;
            Step::Refresh
        }
        Notification::StartFile => {
            engine.set_phase(EnginePhase::Loaded);
            if let Some(head) = engine.queue().head().await {
                info!(title = %head.title, "playing");
                if let Some(s) = scrobbler {
                    if !head.entity_id.is_empty() {
                        s.now_playing(&head.entity_id).await;
                    }
                }
            }
            Step::Refresh
        }
        Notification::Idle | Notification::None => Step::Skip,
        Notification::PropertyChange { .. } => Step::Refresh,
        Notification::Shutdown => Step::Exit,
        Notification::Other(name) => {
            let uri = engine
                .queue()
                .head()
                .await
                .map(|item| item.uri)
                .unwrap_or_default();
            debug!(event = %name, %uri, "player event");
            Step::Refresh
        }
    }
}

async fn on_end_file(engine: &PlaybackEngine, scrobbler: Option<&dyn Scrobbler>, reason: EndReason) {
    engine.set_phase(EnginePhase::Idle);
    let finished = engine.queue().pop_front().await;

    if reason == EndReason::Eof {
        if let (Some(s), Some(item)) = (scrobbler, finished.as_ref()) {
            if !item.entity_id.is_empty() {
                s.played(&item.entity_id).await;
            }
        }
    }

    if let Err(e) = engine.play_next_track().await {
        engine.report(DiagnosticLevel::Error, format!("playing next track: {e}"));
    }
}
