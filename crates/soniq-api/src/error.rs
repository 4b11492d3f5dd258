use thiserror::Error;

/// Top-level error type for the `soniq-api` crate.
///
/// Only transport-level and decoding failures are errors. A well-formed
/// response whose `status` is `"failed"` is returned as data (see
/// [`Response::is_ok`](crate::Response::is_ok)) so callers can inspect the
/// server's error code themselves.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// The request did not complete within the configured timeout.
    /// The in-flight request is abandoned; nothing is retried.
    #[error("Request to {endpoint} timed out after {timeout_ms}ms")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The server answered with a non-2xx HTTP status.
    #[error("HTTP {status} from {endpoint}")]
    Http { endpoint: String, status: u16 },

    /// HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the server was reached but answered too slowly.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Map a `reqwest` failure, splitting timeouts out of generic transport errors.
    pub(crate) fn from_send(err: reqwest::Error, endpoint: &str, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                endpoint: endpoint.to_owned(),
                timeout_ms,
            }
        } else {
            Self::Transport(err)
        }
    }
}
