// soniq-core: Playback queue, engine control and session lifecycle between
// soniq-api and a UI.

pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod library;
pub mod queue;
pub mod session;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::{Scrobbler, run_event_bridge};
pub use config::SessionConfig;
pub use engine::{
    DEFAULT_ENGINE_TIMEOUT, Diagnostic, DiagnosticLevel, EndReason, EngineCommand, EnginePhase,
    Notification, PlaybackBackend, PlaybackEngine, PlaybackState, PlayerStatus, Property,
    PropertyValue, format_player_status,
};
pub use error::{CoreError, EngineError};
pub use queue::{PlaybackQueue, QueueItem};
pub use session::Session;
pub use stream::StatusStream;
