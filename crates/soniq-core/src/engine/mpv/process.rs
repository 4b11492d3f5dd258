// mpv process spawning and IPC socket connection.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::debug;

use crate::error::EngineError;

const CONNECT_RETRY: Duration = Duration::from_millis(50);

/// Per-process socket path under the system temp dir.
pub(crate) fn default_socket_path() -> PathBuf {
    std::env::temp_dir().join(format!("soniq-mpv-{}.sock", std::process::id()))
}

/// Start mpv idle, audio only, listening on `socket`.
pub(crate) fn spawn_mpv(binary: &Path, socket: &Path) -> Result<Child, EngineError> {
    debug!(binary = %binary.display(), socket = %socket.display(), "spawning mpv");
    Command::new(binary)
        .arg("--idle=yes")
        .arg("--no-video")
        .arg("--audio-display=no")
        .arg("--no-terminal")
        .arg(format!("--input-ipc-server={}", socket.display()))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| EngineError::Spawn {
            reason: format!("{}: {e}", binary.display()),
        })
}

/// Connect to the IPC socket, retrying until mpv has created it.
pub(crate) async fn connect_socket(
    socket: &Path,
    child: &mut Child,
    timeout: Duration,
) -> Result<UnixStream, EngineError> {
    let deadline = Instant::now() + timeout;
    loop {
        match UnixStream::connect(socket).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                if let Ok(Some(status)) = child.try_wait() {
                    return Err(EngineError::Spawn {
                        reason: format!("mpv exited before opening its IPC socket ({status})"),
                    });
                }
                if Instant::now() >= deadline {
                    return Err(EngineError::Spawn {
                        reason: format!("IPC socket {} not ready: {e}", socket.display()),
                    });
                }
                tokio::time::sleep(CONNECT_RETRY).await;
            }
        }
    }
}
