// mpv backend over JSON IPC.
//
// Layout:
// - `process.rs`  spawning mpv and connecting to its Unix socket
// - `protocol.rs` request/reply/event JSON shapes
// - this file     the `PlaybackBackend` implementation and reader task
//
// Replies are matched to requests by `request_id`. The reader task resolves
// pending requests and forwards events as `Notification`s. It never waits on
// the notification consumer, so a slow bridge cannot delay replies.

mod process;
mod protocol;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::process::Child;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use self::protocol::{Incoming, PROPERTY_UNAVAILABLE, Reply, Request};
use crate::engine::backend::{
    EngineCommand, Notification, PlaybackBackend, Property, PropertyValue,
};
use crate::error::EngineError;

/// Properties observed so the bridge hears about position/volume changes.
const OBSERVED: [Property; 3] = [Property::TimePos, Property::Duration, Property::Volume];

/// How to start mpv.
#[derive(Debug, Clone)]
pub struct MpvOptions {
    /// mpv executable; looked up on `PATH` when not absolute.
    pub binary: PathBuf,
    /// IPC socket path. Defaults to a per-process path in the temp dir.
    pub socket_path: Option<PathBuf>,
    /// How long to wait for mpv to open its socket.
    pub startup_timeout: Duration,
}

impl Default for MpvOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("mpv"),
            socket_path: None,
            startup_timeout: Duration::from_secs(5),
        }
    }
}

type Pending = Arc<DashMap<u64, oneshot::Sender<Reply>>>;

/// Removes a request's pending entry when the waiting future goes away,
/// whether it got its reply or was cancelled by a timeout.
struct PendingGuard<'a> {
    pending: &'a Pending,
    request_id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.request_id);
    }
}

/// A running mpv instance controlled over its IPC socket.
pub struct MpvBackend {
    writer: Mutex<OwnedWriteHalf>,
    pending: Pending,
    /// Set by the reader task before it drops outstanding requests.
    closed: Arc<AtomicBool>,
    next_id: AtomicU64,
    socket_path: PathBuf,
    /// Kept so the process is killed when the backend is dropped.
    child: Option<Child>,
    reader: JoinHandle<()>,
}

impl MpvBackend {
    /// Spawn mpv and connect to it.
    ///
    /// Returns the backend and the receiving end of its notification
    /// channel, which the event bridge drains.
    pub async fn spawn(
        options: &MpvOptions,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Notification>), EngineError> {
        let socket_path = options
            .socket_path
            .clone()
            .unwrap_or_else(process::default_socket_path);
        // A stale socket from a crashed run would make mpv fail to bind.
        let _ = std::fs::remove_file(&socket_path);

        let mut child = process::spawn_mpv(&options.binary, &socket_path)?;
        let stream =
            process::connect_socket(&socket_path, &mut child, options.startup_timeout).await?;

        let (backend, rx) = Self::from_stream(stream, socket_path, Some(child));
        backend.observe_properties().await?;
        debug!(socket = %backend.socket_path.display(), "mpv ready");
        Ok((backend, rx))
    }

    /// Attach to an mpv already listening on `socket_path`.
    pub async fn connect(
        socket_path: &Path,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Notification>), EngineError> {
        let stream = UnixStream::connect(socket_path)
            .await
            .map_err(|e| EngineError::Spawn {
                reason: format!("connecting to {}: {e}", socket_path.display()),
            })?;
        let (backend, rx) = Self::from_stream(stream, socket_path.to_path_buf(), None);
        backend.observe_properties().await?;
        Ok((backend, rx))
    }

    fn from_stream(
        stream: UnixStream,
        socket_path: PathBuf,
        child: Option<Child>,
    ) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (read_half, write_half) = stream.into_split();
        let pending: Pending = Arc::new(DashMap::new());
        let closed = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_loop(
            read_half,
            Arc::clone(&pending),
            Arc::clone(&closed),
            tx,
        ));

        let backend = Self {
            writer: Mutex::new(write_half),
            pending,
            closed,
            next_id: AtomicU64::new(1),
            socket_path,
            child,
            reader,
        };
        (backend, rx)
    }

    async fn observe_properties(&self) -> Result<(), EngineError> {
        for (id, property) in (1u64..).zip(OBSERVED) {
            let name: &'static str = property.into();
            let args = [
                Value::from("observe_property"),
                Value::from(id),
                Value::from(name),
            ];
            self.request(&args)
                .await?
                .map_err(|reason| EngineError::CommandFailed {
                    command: format!("observe_property {name}"),
                    reason,
                })?;
        }
        Ok(())
    }

    /// Send one request and wait for its reply.
    async fn request(&self, args: &[Value]) -> Result<Reply, EngineError> {
        let request_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(request_id, tx);
        let _guard = PendingGuard {
            pending: &self.pending,
            request_id,
        };
        // Checked after inserting: either the reader's final clear sees
        // this entry, or the flag is already visible here.
        if self.closed.load(Ordering::SeqCst) {
            return Err(EngineError::Disconnected);
        }

        let mut line = serde_json::to_vec(&Request {
            command: args,
            request_id,
        })
        .map_err(|e| EngineError::CommandFailed {
            command: args.first().map(ToString::to_string).unwrap_or_default(),
            reason: e.to_string(),
        })?;
        line.push(b'\n');

        trace!(request_id, "mpv request");
        let written = self.writer.lock().await.write_all(&line).await;
        if let Err(e) = written {
            warn!(error = %e, "mpv IPC write failed");
            return Err(EngineError::Disconnected);
        }

        rx.await.map_err(|_| EngineError::Disconnected)
    }
}

impl Drop for MpvBackend {
    fn drop(&mut self) {
        self.reader.abort();
        // Only clean up a socket belonging to an mpv we started.
        if self.child.is_some() {
            let _ = std::fs::remove_file(&self.socket_path);
        }
    }
}

#[async_trait]
impl PlaybackBackend for MpvBackend {
    async fn command(&self, command: EngineCommand) -> Result<(), EngineError> {
        let reply = self.request(&command.args()).await?;
        reply
            .map(|_| ())
            .map_err(|reason| EngineError::CommandFailed {
                command: command.name().to_owned(),
                reason,
            })
    }

    async fn get_property(&self, property: Property) -> Result<Option<PropertyValue>, EngineError> {
        let name: &'static str = property.into();
        let args = [Value::from("get_property"), Value::from(name)];
        match self.request(&args).await? {
            Ok(data) => Ok(data.and_then(protocol::to_property_value)),
            Err(reason) if reason == PROPERTY_UNAVAILABLE => Ok(None),
            Err(reason) => Err(EngineError::CommandFailed {
                command: format!("get_property {name}"),
                reason,
            }),
        }
    }

    async fn set_property(
        &self,
        property: Property,
        value: PropertyValue,
    ) -> Result<(), EngineError> {
        let name: &'static str = property.into();
        let args = [
            Value::from("set_property"),
            Value::from(name),
            protocol::from_property_value(value),
        ];
        self.request(&args)
            .await?
            .map(|_| ())
            .map_err(|reason| EngineError::CommandFailed {
                command: format!("set_property {name}"),
                reason,
            })
    }
}

// ── Reader task ──────────────────────────────────────────────────────

async fn read_loop(
    read_half: OwnedReadHalf,
    pending: Pending,
    closed: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<Notification>,
) {
    let mut lines = BufReader::new(read_half).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match protocol::parse_line(&line) {
                Ok(Some(Incoming::Reply { request_id, reply })) => {
                    if let Some((_, tx)) = pending.remove(&request_id) {
                        let _ = tx.send(reply);
                    } else {
                        trace!(request_id, "reply for abandoned request");
                    }
                }
                Ok(Some(Incoming::Event(notification))) => {
                    trace!(event = notification.name(), "mpv event");
                    let shutdown = notification == Notification::Shutdown;
                    if events.send(notification).is_err() || shutdown {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "undecodable mpv IPC line"),
            },
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "mpv IPC read failed");
                break;
            }
        }
    }

    debug!("mpv IPC reader finished");
    // Outstanding requests resolve as Disconnected.
    closed.store(true, Ordering::SeqCst);
    pending.clear();
    let _ = events.send(Notification::Shutdown);
}
