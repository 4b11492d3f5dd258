// ── Playback engine ──
//
// Drives one backend session and owns the queue's relationship to it.
// Every backend call is bounded by the engine timeout. The engine phase
// makes the "replacing the current track" window explicit so the event
// bridge can ignore the end-of-file that a replacement causes.

mod backend;
#[cfg(unix)]
pub mod mpv;
mod status;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

pub use backend::{
    EndReason, EngineCommand, Notification, PlaybackBackend, Property, PropertyValue,
};
pub use status::{PlaybackState, PlayerStatus, format_player_status};

use crate::error::EngineError;
use crate::queue::{PlaybackQueue, QueueItem};

/// Default bound on a single backend call.
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(1);

const DIAGNOSTIC_CHANNEL_SIZE: usize = 128;

/// Where the engine is in its load cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnginePhase {
    /// Nothing has been loaded since the last end-of-file.
    #[default]
    Idle,
    /// A `loadfile` replacing the current track is in flight. The
    /// end-of-file for the old track must not advance the queue.
    Replacing,
    /// A track has started.
    Loaded,
}

/// Severity of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

/// A message for the UI's log pane.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub at: DateTime<Utc>,
    pub level: DiagnosticLevel,
    pub message: String,
}

/// Control surface over a [`PlaybackBackend`].
pub struct PlaybackEngine {
    backend: Arc<dyn PlaybackBackend>,
    queue: PlaybackQueue,
    phase: watch::Sender<EnginePhase>,
    status: watch::Sender<PlayerStatus>,
    diagnostics: broadcast::Sender<Diagnostic>,
    timeout: Duration,
}

impl PlaybackEngine {
    pub fn new(backend: Arc<dyn PlaybackBackend>, queue: PlaybackQueue, timeout: Duration) -> Self {
        let (phase, _) = watch::channel(EnginePhase::Idle);
        let (status, _) = watch::channel(PlayerStatus::default());
        let (diagnostics, _) = broadcast::channel(DIAGNOSTIC_CHANNEL_SIZE);
        Self {
            backend,
            queue,
            phase,
            status,
            diagnostics,
            timeout,
        }
    }

    pub fn queue(&self) -> &PlaybackQueue {
        &self.queue
    }

    pub fn phase(&self) -> EnginePhase {
        *self.phase.borrow()
    }

    pub(crate) fn set_phase(&self, phase: EnginePhase) {
        let previous = self.phase.send_replace(phase);
        if previous != phase {
            debug!(?previous, ?phase, "engine phase");
        }
    }

    fn leave_replacing(&self) {
        let left = self.phase.send_if_modified(|phase| {
            if *phase == EnginePhase::Replacing {
                *phase = EnginePhase::Idle;
                true
            } else {
                false
            }
        });
        if left {
            debug!("pending replacement abandoned");
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Play `item` now, replacing the whole queue.
    ///
    /// Holds the queue write lock for the duration, so no other writer
    /// observes the queue between the replacement and the `loadfile`.
    /// If the engine refuses the load, the previous phase is restored so
    /// later end-of-file events advance the queue again.
    pub async fn play(&self, item: QueueItem) -> Result<(), EngineError> {
        let mut queue = self.queue.lock().await;
        let previous = self.phase.send_replace(EnginePhase::Replacing);
        debug!(?previous, "replacing current track");

        let result = async {
            if self.is_paused().await.unwrap_or(false) {
                self.send(EngineCommand::CyclePause).await?;
            }
            let uri = item.uri.clone();
            queue.clear();
            queue.push(item);
            self.send(EngineCommand::LoadFile(uri)).await
        }
        .await;

        if let Err(e) = &result {
            self.report(DiagnosticLevel::Error, format!("loading track: {e}"));
            self.set_phase(previous);
        }
        result
    }

    /// Load the queue head, if any. The queue itself is not changed.
    ///
    /// Returns whether a track was loaded.
    pub async fn play_next_track(&self) -> Result<bool, EngineError> {
        match self.queue.head().await {
            Some(item) => {
                self.send(EngineCommand::LoadFile(item.uri)).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Toggle pause, or start the queue if nothing is loaded.
    ///
    /// Returns the state the player is in afterwards.
    pub async fn pause(&self) -> Result<PlaybackState, EngineError> {
        if self.is_song_loaded().await? {
            let was_paused = self.is_paused().await?;
            self.send(EngineCommand::CyclePause).await?;
            return Ok(if was_paused {
                PlaybackState::Playing
            } else {
                PlaybackState::Paused
            });
        }

        if self.queue.is_empty().await {
            return Ok(PlaybackState::Stopped);
        }
        self.play_next_track().await?;
        Ok(PlaybackState::Playing)
    }

    /// Stop playback. The queue is left as is.
    ///
    /// Abandons a pending replacement: whatever end-of-file follows is the
    /// stop's, not the replacement's.
    pub async fn stop(&self) -> Result<(), EngineError> {
        self.leave_replacing();
        self.send(EngineCommand::Stop).await
    }

    /// Empty the queue, then stop.
    pub async fn clear_queue(&self) -> Result<(), EngineError> {
        self.queue.clear().await;
        self.stop().await
    }

    /// Remove the queue entry at `index`.
    ///
    /// Removing the head while a track is loaded stops the engine instead;
    /// the head is dropped when the engine reports end-of-file. Returns
    /// `false` for an out-of-range index.
    pub async fn remove_from_queue(&self, index: usize) -> Result<bool, EngineError> {
        if index >= self.queue.len().await {
            return Ok(false);
        }
        if index == 0 && self.is_song_loaded().await? {
            self.stop().await?;
            return Ok(true);
        }
        Ok(self.queue.remove(index).await.is_some())
    }

    /// Change volume by `delta`, clamped to `[0, 100]`.
    ///
    /// Does nothing when the engine reports no volume. Returns the new value.
    pub async fn adjust_volume(&self, delta: i64) -> Result<Option<i64>, EngineError> {
        let Some(current) = self.read_volume().await? else {
            return Ok(None);
        };
        self.set_volume(current.saturating_add(delta)).await.map(Some)
    }

    /// Set an absolute volume, clamped to `[0, 100]`.
    pub async fn set_volume(&self, volume: i64) -> Result<i64, EngineError> {
        let volume = volume.clamp(0, 100);
        self.bounded(
            "set volume",
            self.backend
                .set_property(Property::Volume, PropertyValue::Int(volume)),
        )
        .await?;
        Ok(volume)
    }

    /// Relative seek in seconds.
    pub async fn seek(&self, delta_secs: f64) -> Result<(), EngineError> {
        self.send(EngineCommand::Seek(delta_secs)).await
    }

    /// Ask the engine to exit.
    pub async fn quit(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::Quit).await
    }

    // ── Probes ───────────────────────────────────────────────────────

    pub async fn is_song_loaded(&self) -> Result<bool, EngineError> {
        let idle = self.required_flag(Property::IdleActive).await?;
        Ok(!idle)
    }

    pub async fn is_paused(&self) -> Result<bool, EngineError> {
        self.required_flag(Property::Pause).await
    }

    pub async fn volume(&self) -> Result<i64, EngineError> {
        self.read_volume()
            .await?
            .ok_or(EngineError::PropertyUnavailable {
                property: Property::Volume,
            })
    }

    /// Current playback state. Probe failures yield [`PlaybackState::Error`].
    pub async fn state(&self) -> PlaybackState {
        if self.phase() == EnginePhase::Replacing {
            return PlaybackState::Playing;
        }
        match (self.is_song_loaded().await, self.is_paused().await) {
            (Ok(false), _) => PlaybackState::Stopped,
            (Ok(true), Ok(true)) => PlaybackState::Paused,
            (Ok(true), Ok(false)) => PlaybackState::Playing,
            (Err(e), _) | (_, Err(e)) => {
                debug!(error = %e, "state probe failed");
                PlaybackState::Error
            }
        }
    }

    // ── Status & diagnostics ─────────────────────────────────────────

    /// Latest published status.
    pub fn status(&self) -> PlayerStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<PlayerStatus> {
        self.status.subscribe()
    }

    pub fn subscribe_diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.diagnostics.subscribe()
    }

    /// Log `message` and publish it for the UI.
    pub fn report(&self, level: DiagnosticLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            DiagnosticLevel::Info => debug!("{message}"),
            DiagnosticLevel::Warning | DiagnosticLevel::Error => warn!("{message}"),
        }
        // No receivers is fine.
        let _ = self.diagnostics.send(Diagnostic {
            at: Utc::now(),
            level,
            message,
        });
    }

    /// Re-read position, duration and volume and publish a fresh status.
    ///
    /// Read failures are reported and shown as absent values.
    pub async fn refresh_status(&self) -> PlayerStatus {
        let position = self.optional_f64(Property::TimePos).await;
        let duration = self.optional_f64(Property::Duration).await;
        let volume = match self.read_volume().await {
            Ok(v) => v,
            Err(e) => {
                self.report(DiagnosticLevel::Warning, format!("reading volume: {e}"));
                None
            }
        };

        let state = self.state().await;
        let (current, queue_len) = {
            let queue = self.queue.snapshot().await;
            (queue.first().cloned(), queue.len())
        };

        let status = PlayerStatus {
            state,
            volume,
            position,
            duration,
            current,
            queue_len,
        };
        self.status.send_replace(status.clone());
        status
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        debug!(command = command.name(), "engine command");
        let name = command.name();
        self.bounded(name, self.backend.command(command)).await
    }

    async fn get(&self, property: Property) -> Result<Option<PropertyValue>, EngineError> {
        let name: &'static str = property.into();
        self.bounded(name, self.backend.get_property(property)).await
    }

    async fn required_flag(&self, property: Property) -> Result<bool, EngineError> {
        match self.get(property).await? {
            None => Err(EngineError::PropertyUnavailable { property }),
            Some(value) => value.as_flag().ok_or(EngineError::PropertyType {
                property,
                expected: "flag",
            }),
        }
    }

    async fn read_volume(&self) -> Result<Option<i64>, EngineError> {
        match self.get(Property::Volume).await? {
            None => Ok(None),
            Some(value) => value.as_i64().map(Some).ok_or(EngineError::PropertyType {
                property: Property::Volume,
                expected: "number",
            }),
        }
    }

    async fn optional_f64(&self, property: Property) -> Option<f64> {
        match self.get(property).await {
            Ok(value) => value.and_then(|v| v.as_f64()),
            Err(e) => {
                self.report(
                    DiagnosticLevel::Warning,
                    format!("reading {property}: {e}"),
                );
                None
            }
        }
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        fut: impl Future<Output = Result<T, EngineError>>,
    ) -> Result<T, EngineError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| EngineError::Timeout {
                operation: operation.to_owned(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })?
    }
}
