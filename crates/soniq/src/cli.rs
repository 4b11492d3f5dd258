//! Clap derive structures for the `soniq` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// soniq -- browse and play a Subsonic music library from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "soniq",
    version,
    about = "Browse and play music from Subsonic-compatible servers",
    long_about = "A terminal client for Subsonic-compatible media servers \
        (Navidrome, Airsonic, Gonic, ...).\n\n\
        Browses the library over the Subsonic REST API and plays through mpv.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "SONIQ_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 's', env = "SONIQ_SERVER", global = true)]
    pub server: Option<String>,

    /// Username (overrides profile)
    #[arg(long, short = 'u', env = "SONIQ_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SONIQ_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "SONIQ_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in milliseconds (overrides profile)
    #[arg(long, env = "SONIQ_TIMEOUT_MS", global = true)]
    pub timeout_ms: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Plain text, one id per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the server is reachable and accepts the credentials
    Ping,

    /// List artists from the library index
    #[command(alias = "ar")]
    Artists,

    /// List a music directory (artist or album)
    #[command(alias = "ls")]
    Browse(BrowseArgs),

    /// List playlists
    #[command(alias = "pl")]
    Playlists,

    /// List a random selection of songs
    Random,

    /// List starred artists, albums and songs
    Starred,

    /// Play songs, directories or playlists through mpv
    Play(PlayArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Subcommand Arguments ─────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BrowseArgs {
    /// Directory id (as shown by `soniq artists`)
    pub id: String,
}

#[derive(Debug, Args)]
pub struct PlayArgs {
    /// Song ids (directory ids with --dir, playlist ids with --playlist)
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Treat ids as directories and queue everything beneath them
    #[arg(long, short = 'd', conflicts_with = "playlist")]
    pub dir: bool,

    /// Treat ids as playlists
    #[arg(long)]
    pub playlist: bool,

    /// Write logs here instead of the default state directory
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
