//! Headless playback: queue the requested ids, start mpv, and print a
//! status line whenever it changes until the queue drains or ctrl-c.

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use soniq_api::Entity;
use soniq_core::{DiagnosticLevel, PlaybackState, PlayerStatus, Session, SessionConfig};

use crate::cli::{GlobalOpts, PlayArgs};
use crate::error::CliError;
use crate::output;

use super::ok_data;

#[cfg(unix)]
pub async fn handle(
    config: SessionConfig,
    args: PlayArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let session = Session::start(config).await?;
    let result = run(&session, &args, global).await;
    session.shutdown().await;
    result
}

#[cfg(not(unix))]
pub async fn handle(
    _config: SessionConfig,
    _args: PlayArgs,
    _global: &GlobalOpts,
) -> Result<(), CliError> {
    Err(CliError::Unsupported {
        operation: "play".into(),
    })
}

#[cfg_attr(not(unix), allow(dead_code))]
async fn run(session: &Session, args: &PlayArgs, global: &GlobalOpts) -> Result<(), CliError> {
    session.connect().await?;

    let queued = enqueue(session, args).await?;
    if queued == 0 {
        return Err(CliError::Validation {
            field: "ids".into(),
            reason: "nothing playable found".into(),
        });
    }
    info!(queued, "starting playback");

    let mut status = session.status_stream();
    let mut diagnostics = session.diagnostics();
    session.engine().play_next_track().await?;

    let mut drain = DrainWatch::default();
    let mut last_line = String::new();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
            update = status.changed() => {
                let Some(update) = update else { break };
                let line = output::render_status(global.output, &update);
                if line != last_line {
                    output::print_output(&line, global.quiet);
                    last_line = line;
                }
                if drain.finished(&update) {
                    break;
                }
            }
            diag = diagnostics.recv() => match diag {
                Ok(diag) if diag.level != DiagnosticLevel::Info => {
                    eprintln!("{}: {}", diag.level, diag.message);
                }
                Err(RecvError::Closed) => break,
                Ok(_) | Err(RecvError::Lagged(_)) => {}
            },
        }
    }
    Ok(())
}

/// Tracks when headless playback is done. A status published before the
/// queue was filled must not end the run, so the queue has to be seen
/// non-empty first, then empty with the player stopped.
#[derive(Debug, Default)]
#[cfg_attr(not(unix), allow(dead_code))]
struct DrainWatch {
    started: bool,
}

impl DrainWatch {
    #[cfg_attr(not(unix), allow(dead_code))]
    fn finished(&mut self, status: &PlayerStatus) -> bool {
        if status.queue_len > 0 {
            self.started = true;
            return false;
        }
        self.started && status.state == PlaybackState::Stopped
    }
}

/// Expand the requested ids into queue items. Returns the count added.
#[cfg_attr(not(unix), allow(dead_code))]
async fn enqueue(session: &Session, args: &PlayArgs) -> Result<usize, CliError> {
    let mut added = 0;
    for id in &args.ids {
        if args.dir {
            added += session.enqueue_directory(id).await?;
        } else if args.playlist {
            let playlist = ok_data(session.client().get_playlist(id).await?)?;
            added += session.enqueue_playlist(&playlist).await;
        } else {
            let song = Entity {
                id: id.clone(),
                title: id.clone(),
                ..Entity::default()
            };
            session.enqueue_song(&song, "").await;
            added += 1;
        }
    }
    Ok(added)
}
