// ── Runtime session configuration ──
//
// Describes how to reach the server and how to run the playback engine.
// Carries credential data but never touches disk; soniq-config (or a test)
// builds one and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use soniq_api::transport::DEFAULT_TIMEOUT;
use soniq_api::{Credentials, TransportConfig};

use crate::engine::DEFAULT_ENGINE_TIMEOUT;

/// Everything a [`Session`](crate::Session) needs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub server: Url,
    pub username: String,
    pub password: SecretString,
    /// Send the password in clear instead of a salted token.
    pub plaintext_auth: bool,
    /// Bound on each server request.
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
    /// Bound on each playback-engine call.
    pub engine_timeout: Duration,
    /// mpv executable.
    pub mpv_path: PathBuf,
    /// Report now-playing and completed plays to the server.
    pub scrobble: bool,
}

impl SessionConfig {
    pub fn new(server: Url, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            server,
            username: username.into(),
            password,
            plaintext_auth: false,
            timeout: DEFAULT_TIMEOUT,
            accept_invalid_certs: false,
            engine_timeout: DEFAULT_ENGINE_TIMEOUT,
            mpv_path: PathBuf::from("mpv"),
            scrobble: true,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
            .with_plaintext_auth(self.plaintext_auth)
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout,
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }
}
