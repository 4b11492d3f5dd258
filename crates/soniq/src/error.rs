//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use soniq_config::ConfigError;
use soniq_core::{CoreError, EngineError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PLAYBACK: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

// Subsonic error codes with a dedicated mapping.
const WRONG_CREDENTIALS: i32 = 40;
const TOKEN_AUTH_UNSUPPORTED: i32 = 41;
const DATA_NOT_FOUND: i32 = 70;

#[derive(Debug, Error, Diagnostic)]
#[allow(dead_code)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to server at {url}")]
    #[diagnostic(
        code(soniq::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Server did not answer within {timeout_ms}ms")]
    #[diagnostic(
        code(soniq::timeout),
        help("Increase the timeout with --timeout-ms or timeout_ms in your profile.")
    )]
    Timeout { timeout_ms: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(soniq::auth_failed),
        help(
            "Verify the username and password for this profile.\n\
             Servers backed by LDAP need plaintext_auth = true."
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(soniq::no_credentials),
        help(
            "Set username and password in the profile, or export \
             SONIQ_USERNAME and SONIQ_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Server ───────────────────────────────────────────────────────
    #[error("Not found: {message}")]
    #[diagnostic(
        code(soniq::not_found),
        help("Run: soniq artists to see available directory ids")
    )]
    NotFound { message: String },

    #[error("Server error ({code}): {message}")]
    #[diagnostic(code(soniq::server_error))]
    Server { code: i32, message: String },

    #[error("API error: {message}")]
    #[diagnostic(code(soniq::api_error))]
    Api { message: String },

    // ── Playback ─────────────────────────────────────────────────────
    #[error("Playback failed: {message}")]
    #[diagnostic(
        code(soniq::playback),
        help("Check that mpv is installed, or set mpv_path in your profile.")
    )]
    Playback { message: String },

    #[error("'{operation}' is not supported on this platform")]
    #[diagnostic(code(soniq::unsupported))]
    Unsupported { operation: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(soniq::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(soniq::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No server configured")]
    #[diagnostic(
        code(soniq::no_config),
        help(
            "Pass --server and --username, or add a profile to:\n\
             {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(soniq::config))]
    Config(Box<ConfigError>),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Playback { .. } | Self::Unsupported { .. } => exit_code::PLAYBACK,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Error for a response whose status was `"failed"`.
    pub fn from_response<T>(resp: &soniq_api::Response<T>) -> Self {
        CoreError::from_response(resp).into()
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::Timeout { timeout_ms } => CliError::Timeout { timeout_ms },

            CoreError::Server { code, message }
                if code == WRONG_CREDENTIALS || code == TOKEN_AUTH_UNSUPPORTED =>
            {
                CliError::AuthFailed { message }
            }

            CoreError::Server { code, message } if code == DATA_NOT_FOUND => {
                CliError::NotFound { message }
            }

            CoreError::Server { code, message } => CliError::Server { code, message },

            CoreError::Api { message, .. } => CliError::Api { message },

            CoreError::Engine(EngineError::Timeout { timeout_ms, .. }) => {
                CliError::Playback {
                    message: format!("mpv did not answer within {timeout_ms}ms"),
                }
            }

            CoreError::Engine(e) => CliError::Playback {
                message: e.to_string(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "server".into(),
                reason: message,
            },
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        CoreError::Engine(err).into()
    }
}

impl From<soniq_api::Error> for CliError {
    fn from(err: soniq_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(Box::new(other)),
        }
    }
}
