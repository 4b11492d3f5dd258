//! Output formatting: table, JSON, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! JSON uses serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use soniq_core::{PlaybackState, PlayerStatus};

use crate::cli::OutputFormat;

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Playback status ──────────────────────────────────────────────────

/// One line per status update: state, track, `[VOL%][MM:SS/MM:SS]`.
pub fn render_status(format: OutputFormat, status: &PlayerStatus) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(status).unwrap_or_default(),
        OutputFormat::Plain => status.status_line(),
        OutputFormat::Table => {
            let track = status
                .current
                .as_ref()
                .map(|item| format!("{} - {}", item.artist, item.title))
                .unwrap_or_default();
            format!(
                "{:<7} {} {track}",
                state_label(status.state),
                status.status_line()
            )
        }
    }
}

fn state_label(state: PlaybackState) -> String {
    let label = state.to_string();
    if !io::stdout().is_terminal() || std::env::var_os("NO_COLOR").is_some() {
        return label;
    }
    match state {
        PlaybackState::Playing => label.green().to_string(),
        PlaybackState::Paused => label.yellow().to_string(),
        PlaybackState::Stopped => label.dimmed().to_string(),
        PlaybackState::Error => label.red().to_string(),
    }
}

/// `M:SS`, or `H:MM:SS` past an hour.
pub fn format_duration(seconds: u32) -> String {
    let (h, m, s) = (seconds / 3600, (seconds / 60) % 60, seconds % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Pretty-printed JSON.
fn render_json<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_default()
}
