// ── Core error types ──
//
// `EngineError` covers the playback backend. `CoreError` is what the UI
// sees: transport-layer failures from soniq-api are translated into
// domain variants by the `From` impls below.

use thiserror::Error;

use crate::engine::Property;

/// Failures talking to the playback engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine has no value for the property right now
    /// (e.g. `time-pos` with nothing loaded).
    #[error("Property {property} is unavailable")]
    PropertyUnavailable { property: Property },

    /// The engine answered with a value of the wrong kind.
    #[error("Property {property} has unexpected type (expected {expected})")]
    PropertyType {
        property: Property,
        expected: &'static str,
    },

    #[error("Engine command {command} failed: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("Engine did not answer {operation} within {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Playback engine disconnected")]
    Disconnected,

    /// The engine could not be started. Fatal to the session.
    #[error("Failed to start playback engine: {reason}")]
    Spawn { reason: String },
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Server errors ────────────────────────────────────────────────
    #[error("Cannot reach server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Server did not answer within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The server answered with `status: "failed"`.
    #[error("Server rejected request ({code}): {message}")]
    Server { code: i32, message: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Playback errors ──────────────────────────────────────────────
    #[error(transparent)]
    Engine(#[from] EngineError),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<soniq_api::Error> for CoreError {
    fn from(err: soniq_api::Error) -> Self {
        match err {
            soniq_api::Error::Timeout { timeout_ms, .. } => CoreError::Timeout { timeout_ms },
            soniq_api::Error::Transport(ref e) if e.is_connect() => CoreError::ConnectionFailed {
                url: e
                    .url()
                    .map(|u| format!("{}://{}", u.scheme(), u.authority()))
                    .unwrap_or_else(|| "<unknown>".into()),
                reason: e.to_string(),
            },
            soniq_api::Error::Transport(e) => CoreError::Api {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            soniq_api::Error::Http { endpoint, status } => CoreError::Api {
                message: format!("{endpoint} answered HTTP {status}"),
                status: Some(status),
            },
            soniq_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid server URL: {e}"),
            },
            soniq_api::Error::ClientBuild(message) => CoreError::Config { message },
            soniq_api::Error::Deserialization { message, .. } => CoreError::Api {
                message: format!("unexpected response: {message}"),
                status: None,
            },
        }
    }
}

impl CoreError {
    /// Build a [`CoreError::Server`] from a failed response.
    pub fn from_response<T>(resp: &soniq_api::Response<T>) -> Self {
        match &resp.error {
            Some(e) => CoreError::Server {
                code: e.code,
                message: e.message.clone(),
            },
            None => CoreError::Server {
                code: 0,
                message: "request failed".into(),
            },
        }
    }
}
