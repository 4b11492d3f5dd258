// ── Playback backend seam ──
//
// The engine talks to audio playback through this trait. `MpvBackend` is the
// production implementation; tests drive the engine with an in-memory fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::EngineError;

/// Commands understood by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// Replace whatever is playing with `uri`.
    LoadFile(String),
    Stop,
    CyclePause,
    /// Relative seek in seconds.
    Seek(f64),
    Quit,
}

impl EngineCommand {
    /// Command name as sent to the engine.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadFile(_) => "loadfile",
            Self::Stop => "stop",
            Self::CyclePause => "cycle",
            Self::Seek(_) => "seek",
            Self::Quit => "quit",
        }
    }

    /// Full argument vector, command name first.
    pub fn args(&self) -> Vec<serde_json::Value> {
        use serde_json::Value;
        match self {
            Self::LoadFile(uri) => vec![Value::from("loadfile"), Value::from(uri.as_str())],
            Self::CyclePause => vec![Value::from("cycle"), Value::from("pause")],
            Self::Seek(delta) => vec![Value::from("seek"), Value::from(*delta)],
            Self::Stop | Self::Quit => vec![Value::from(self.name())],
        }
    }
}

/// Engine properties the core reads or writes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Property {
    Pause,
    Volume,
    TimePos,
    Duration,
    IdleActive,
}

/// A typed property value. The caller checks the kind it expects.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Flag(bool),
    Int(i64),
    Double(f64),
    Text(String),
}

impl PropertyValue {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric value as a double; integers widen.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Numeric value as an integer; doubles round to nearest.
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Double(d) if d.is_finite() => Some(d.round() as i64),
            _ => None,
        }
    }
}

/// Why a file stopped playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum EndReason {
    /// Reached the end of the stream.
    Eof,
    Stop,
    Quit,
    Error,
    Redirect,
    Unknown,
}

impl EndReason {
    /// Parse the engine's reason string; anything unrecognised is `Unknown`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "eof" => Self::Eof,
            "stop" => Self::Stop,
            "quit" => Self::Quit,
            "error" => Self::Error,
            "redirect" => Self::Redirect,
            _ => Self::Unknown,
        }
    }
}

/// Asynchronous notifications emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    StartFile,
    EndFile { reason: EndReason },
    Idle,
    None,
    PropertyChange { property: String },
    /// Any other engine event, by name.
    Other(String),
    /// The engine is going away; the bridge exits on this.
    Shutdown,
}

impl Notification {
    pub fn name(&self) -> &str {
        match self {
            Self::StartFile => "start-file",
            Self::EndFile { .. } => "end-file",
            Self::Idle => "idle",
            Self::None => "none",
            Self::PropertyChange { .. } => "property-change",
            Self::Other(name) => name,
            Self::Shutdown => "shutdown",
        }
    }
}

/// One playback session with an audio engine.
///
/// Property reads return `Ok(None)` when the engine has no value, and
/// `Err` only when the engine could not be asked.
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    async fn command(&self, command: EngineCommand) -> Result<(), EngineError>;

    async fn get_property(&self, property: Property) -> Result<Option<PropertyValue>, EngineError>;

    async fn set_property(&self, property: Property, value: PropertyValue)
    -> Result<(), EngineError>;
}
