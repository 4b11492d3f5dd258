// ── Player status ──
//
// Snapshot published on the engine's watch channel after every handled
// notification, plus the `[VOL%][MM:SS/MM:SS]` formatter the UI shows.

use serde::Serialize;
use strum::Display;

use crate::queue::QueueItem;

/// Derived playback state. Never stored; computed from live engine
/// properties and the engine phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
    /// The engine could not be queried.
    Error,
}

/// Latest known playback status.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerStatus {
    pub state: PlaybackState,
    pub volume: Option<i64>,
    /// Seconds into the current track.
    pub position: Option<f64>,
    /// Track length in seconds.
    pub duration: Option<f64>,
    /// Queue head, if any.
    pub current: Option<QueueItem>,
    pub queue_len: usize,
}

impl PlayerStatus {
    /// `[VOL%][MM:SS/MM:SS]`
    pub fn status_line(&self) -> String {
        format_player_status(self.volume, self.position, self.duration)
    }
}

/// Format the status line. Absent values show as zero; negative position
/// or duration clamp to zero.
pub fn format_player_status(
    volume: Option<i64>,
    position: Option<f64>,
    duration: Option<f64>,
) -> String {
    let volume = volume.unwrap_or(0);
    let (pos_min, pos_sec) = minutes_and_seconds(position.unwrap_or(0.0));
    let (dur_min, dur_sec) = minutes_and_seconds(duration.unwrap_or(0.0));
    format!("[{volume}%][{pos_min:02}:{pos_sec:02}/{dur_min:02}:{dur_sec:02}]")
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn minutes_and_seconds(seconds: f64) -> (u64, u64) {
    // f64::max maps NaN to the other operand.
    let whole = seconds.max(0.0).trunc() as u64;
    (whole / 60, whole % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_volume_position_duration() {
        assert_eq!(
            format_player_status(Some(75), Some(65.9), Some(3599.0)),
            "[75%][01:05/59:59]"
        );
    }

    #[test]
    fn negative_values_clamp_to_zero() {
        assert_eq!(
            format_player_status(Some(50), Some(-3.0), Some(-1.0)),
            "[50%][00:00/00:00]"
        );
    }

    #[test]
    fn absent_values_show_as_zero() {
        assert_eq!(format_player_status(None, None, None), "[0%][00:00/00:00]");
    }

    #[test]
    fn long_tracks_keep_counting_minutes() {
        assert_eq!(
            format_player_status(Some(100), Some(6000.0), Some(7261.0)),
            "[100%][100:00/121:01]"
        );
    }

    #[test]
    fn status_line_uses_snapshot_fields() {
        let status = PlayerStatus {
            volume: Some(30),
            position: Some(10.0),
            duration: Some(200.0),
            ..PlayerStatus::default()
        };
        assert_eq!(status.status_line(), "[30%][00:10/03:20]");
    }
}
