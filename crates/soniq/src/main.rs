mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::path::{Path, PathBuf};

use clap::Parser;
use directories::ProjectDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines are flushed on exit.
    let _guard = init_tracing(&cli);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(cli: &Cli) -> Option<WorkerGuard> {
    let level = match cli.global.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Playback prints status lines on stdout, so its logs go to a file.
    if let Command::Play(ref args) = cli.command {
        let path = args.log_file.clone().unwrap_or_else(default_log_path);
        if let Some(guard) = init_file_tracing(&path, filter()) {
            return Some(guard);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    None
}

fn init_file_tracing(path: &Path, filter: EnvFilter) -> Option<WorkerGuard> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let file = path.file_name()?;
    std::fs::create_dir_all(dir).ok()?;

    let appender = tracing_appender::rolling::never(dir, file);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Some(guard)
}

fn default_log_path() -> PathBuf {
    let dir = ProjectDirs::from("", "soniq", "soniq").map_or_else(
        std::env::temp_dir,
        |dirs| {
            dirs.state_dir()
                .unwrap_or_else(|| dirs.cache_dir())
                .to_path_buf()
        },
    );
    dir.join("soniq.log")
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "soniq", &mut std::io::stdout());
            Ok(())
        }

        // Everything else talks to a server
        cmd => {
            let session_config = config::build_session_config(&cli.global)?;
            tracing::debug!(command = ?cmd, server = %session_config.server, "dispatching command");
            commands::dispatch(cmd, session_config, &cli.global).await
        }
    }
}
