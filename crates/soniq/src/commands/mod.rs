//! Command dispatch: bridges CLI args -> soniq-api / soniq-core -> output.

pub mod library;
pub mod play;

use soniq_api::{Response, SubsonicClient};
use soniq_core::SessionConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: SessionConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Command::Play(args) = cmd {
        return play::handle(config, args, global).await;
    }

    let client = SubsonicClient::new(
        config.server.clone(),
        config.credentials(),
        &config.transport(),
    )?;

    match cmd {
        Command::Ping => library::ping(&client, global).await,
        Command::Artists => library::artists(&client, global).await,
        Command::Browse(args) => library::browse(&client, &args.id, global).await,
        Command::Playlists => library::playlists(&client, global).await,
        Command::Random => library::random(&client, global).await,
        Command::Starred => library::starred(&client, global).await,
        // Play is handled above, Completions before dispatch
        Command::Play(_) | Command::Completions(_) => Ok(()),
    }
}

/// Unwrap a response, turning a `"failed"` status into an error.
pub(crate) fn ok_data<T>(resp: Response<T>) -> Result<T, CliError> {
    if resp.is_ok() {
        Ok(resp.data)
    } else {
        Err(CliError::from_response(&resp))
    }
}
