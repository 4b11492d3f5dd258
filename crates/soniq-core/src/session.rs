// ── Session facade ──
//
// Lifecycle for one server + one playback engine: construction, connect
// (ping and spawn the event bridge), and shutdown. This is what a UI
// holds and calls into.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use soniq_api::{Entity, Playlist, SubsonicClient};

use crate::bridge::{Scrobbler, run_event_bridge};
use crate::config::SessionConfig;
use crate::engine::{
    Diagnostic, Notification, PlaybackBackend, PlaybackEngine, PlayerStatus,
};
use crate::error::CoreError;
use crate::library;
use crate::queue::PlaybackQueue;
use crate::stream::StatusStream;

/// A connected client/player pair.
///
/// Cheaply cloneable via `Arc<SessionInner>`. Does nothing on the network
/// until [`connect()`](Self::connect) is called.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    client: Arc<SubsonicClient>,
    engine: Arc<PlaybackEngine>,
    notifications: Mutex<Option<mpsc::UnboundedReceiver<Notification>>>,
    starred: Mutex<HashSet<String>>,
    connected: watch::Sender<bool>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Session {
    /// Build the server client and start mpv.
    #[cfg(unix)]
    pub async fn start(config: SessionConfig) -> Result<Self, CoreError> {
        use crate::engine::mpv::{MpvBackend, MpvOptions};

        let options = MpvOptions {
            binary: config.mpv_path.clone(),
            ..MpvOptions::default()
        };
        let (backend, notifications) = MpvBackend::spawn(&options).await?;
        Self::with_backend(config, Arc::new(backend), notifications)
    }

    /// Build a session around an existing backend and its notification
    /// channel.
    pub fn with_backend(
        config: SessionConfig,
        backend: Arc<dyn PlaybackBackend>,
        notifications: mpsc::UnboundedReceiver<Notification>,
    ) -> Result<Self, CoreError> {
        let client = SubsonicClient::new(
            config.server.clone(),
            config.credentials(),
            &config.transport(),
        )?;
        let engine = PlaybackEngine::new(backend, PlaybackQueue::new(), config.engine_timeout);
        let (connected, _) = watch::channel(false);

        Ok(Self {
            inner: Arc::new(SessionInner {
                config,
                client: Arc::new(client),
                engine: Arc::new(engine),
                notifications: Mutex::new(Some(notifications)),
                starred: Mutex::new(HashSet::new()),
                connected,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &Arc<SubsonicClient> {
        &self.inner.client
    }

    pub fn engine(&self) -> &Arc<PlaybackEngine> {
        &self.inner.engine
    }

    pub fn queue(&self) -> &PlaybackQueue {
        self.inner.engine.queue()
    }

    pub fn is_connected(&self) -> bool {
        *self.inner.connected.borrow()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Confirm the server accepts our credentials, seed the starred set,
    /// and start the event bridge.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let client = &self.inner.client;

        let ping = client.ping().await?;
        if !ping.is_ok() {
            return Err(CoreError::from_response(&ping));
        }
        debug!(version = %ping.version, "server answered ping");

        match client.get_starred().await {
            Ok(resp) if resp.is_ok() => {
                let mut starred = self.inner.starred.lock().await;
                starred.extend(resp.data.ids().map(str::to_owned));
            }
            Ok(resp) => warn!(error = ?resp.error, "could not load starred items"),
            Err(e) => warn!(error = %e, "could not load starred items"),
        }

        if let Some(rx) = self.inner.notifications.lock().await.take() {
            let scrobbler: Option<Arc<dyn Scrobbler>> = if self.inner.config.scrobble {
                Some(Arc::clone(client) as Arc<dyn Scrobbler>)
            } else {
                None
            };
            let handle = tokio::spawn(run_event_bridge(
                Arc::clone(&self.inner.engine),
                rx,
                scrobbler,
                self.inner.cancel.clone(),
            ));
            self.inner.task_handles.lock().await.push(handle);
        }

        self.inner.connected.send_replace(true);
        info!(server = %self.inner.config.server, "session connected");
        Ok(())
    }

    /// Stop the bridge, ask the engine to quit, and wait for background
    /// tasks.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        if let Err(e) = self.inner.engine.quit().await {
            debug!(error = %e, "engine quit failed (non-fatal)");
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner.connected.send_replace(false);
        debug!("session shut down");
    }

    // ── Queue building ───────────────────────────────────────────────

    /// Replace the queue with `entity` and start playing it.
    pub async fn play_entity(&self, entity: &Entity, fallback_artist: &str) -> Result<(), CoreError> {
        let item = library::queue_item(&self.inner.client, entity, fallback_artist);
        self.inner.engine.play(item).await?;
        Ok(())
    }

    pub async fn enqueue_song(&self, entity: &Entity, fallback_artist: &str) {
        library::enqueue_song(&self.inner.client, self.queue(), entity, fallback_artist).await;
    }

    pub async fn enqueue_directory(&self, id: &str) -> Result<usize, CoreError> {
        library::enqueue_directory(&self.inner.client, self.queue(), id).await
    }

    pub async fn enqueue_playlist(&self, playlist: &Playlist) -> usize {
        library::enqueue_playlist(&self.inner.client, self.queue(), playlist).await
    }

    // ── Stars ────────────────────────────────────────────────────────

    /// Toggle the star on `id`. Returns whether it is now starred locally.
    ///
    /// The local set changes even if the server call fails; the error is
    /// still returned.
    pub async fn toggle_star(&self, id: &str) -> Result<bool, CoreError> {
        let mut starred = self.inner.starred.lock().await;
        let result = self.inner.client.toggle_star(id, &mut starred).await;
        let now_starred = starred.contains(id);
        drop(starred);

        let resp = result?;
        if !resp.is_ok() {
            return Err(CoreError::from_response(&resp));
        }
        Ok(now_starred)
    }

    pub async fn is_starred(&self, id: &str) -> bool {
        self.inner.starred.lock().await.contains(id)
    }

    // ── State observation ────────────────────────────────────────────

    pub fn status(&self) -> PlayerStatus {
        self.inner.engine.status()
    }

    pub fn status_stream(&self) -> StatusStream {
        StatusStream::new(self.inner.engine.subscribe_status())
    }

    pub fn diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.inner.engine.subscribe_diagnostics()
    }

    pub fn connection_state(&self) -> watch::Receiver<bool> {
        self.inner.connected.subscribe()
    }
}
