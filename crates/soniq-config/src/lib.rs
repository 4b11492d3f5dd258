//! Shared configuration for soniq front ends.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `soniq_core::SessionConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use soniq_core::SessionConfig;

/// Keyring service name; entries are keyed `<profile>/password`.
pub const KEYRING_SERVICE: &str = "soniq";

const ENV_PREFIX: &str = "SONIQ_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Server request timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Playback engine call timeout.
    #[serde(default = "default_engine_timeout_ms")]
    pub engine_timeout_ms: u64,

    #[serde(default = "default_mpv_path")]
    pub mpv_path: PathBuf,

    #[serde(default = "default_true")]
    pub scrobble: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout_ms: default_timeout_ms(),
            engine_timeout_ms: default_engine_timeout_ms(),
            mpv_path: default_mpv_path(),
            scrobble: true,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout_ms() -> u64 {
    200
}
fn default_engine_timeout_ms() -> u64 {
    1000
}
fn default_mpv_path() -> PathBuf {
    PathBuf::from("mpv")
}
fn default_true() -> bool {
    true
}

/// A named server profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Server base URL (e.g., "https://music.example.com").
    pub server: String,

    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Send the password instead of a salted token (LDAP-backed servers).
    #[serde(default)]
    pub plaintext_auth: bool,

    /// Accept self-signed certificates.
    pub insecure: Option<bool>,

    /// Override request timeout.
    pub timeout_ms: Option<u64>,

    /// Override mpv executable.
    pub mpv_path: Option<PathBuf>,

    /// Override scrobbling.
    pub scrobble: Option<bool>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "soniq", "soniq").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("soniq");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Environment overrides use `SONIQ_` and `__` as the nesting separator,
/// e.g. `SONIQ_DEFAULTS__TIMEOUT_MS=500`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile selection ───────────────────────────────────────────────

/// Pick the profile named `requested`, else the config's default.
pub fn select_profile<'a>(
    cfg: &'a Config,
    requested: Option<&'a str>,
) -> Result<(&'a str, &'a Profile), ConfigError> {
    let name = requested
        .or(cfg.default_profile.as_deref())
        .unwrap_or("default");
    cfg.profiles
        .get(name)
        .map(|p| (name, p))
        .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve username + password for a profile.
///
/// Password chain: the profile's `password_env` variable, then
/// `SONIQ_PASSWORD`, then the system keyring, then plaintext config.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    resolve_credentials_with(profile, profile_name, keyring_password)
}

/// [`resolve_credentials`] with a caller-supplied keyring lookup.
pub fn resolve_credentials_with(
    profile: &Profile,
    profile_name: &str,
    keyring_lookup: impl Fn(&str) -> Option<String>,
) -> Result<(String, SecretString), ConfigError> {
    let no_credentials = || ConfigError::NoCredentials {
        profile: profile_name.into(),
    };

    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var("SONIQ_USERNAME").ok())
        .ok_or_else(no_credentials)?;

    // 1. Profile's password_env -> env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(pw) = std::env::var(env_name) {
            return Ok((username, SecretString::from(pw)));
        }
    }

    // 2. Global env var
    if let Ok(pw) = std::env::var("SONIQ_PASSWORD") {
        return Ok((username, SecretString::from(pw)));
    }

    // 3. Keyring
    if let Some(pw) = keyring_lookup(profile_name) {
        return Ok((username, SecretString::from(pw)));
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok((username, SecretString::from(pw.clone())));
    }

    Err(no_credentials())
}

fn keyring_password(profile_name: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .and_then(|entry| entry.get_password())
        .ok()
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))?;
    entry.set_password(password)?;
    Ok(())
}

// ── Translation to SessionConfig ────────────────────────────────────

/// Build a `SessionConfig` from a profile and the global defaults.
pub fn profile_to_session_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<SessionConfig, ConfigError> {
    let server = parse_server(&profile.server)?;
    let (username, password) = resolve_credentials(profile, profile_name)?;
    Ok(build_session_config(
        profile, defaults, server, username, password,
    ))
}

/// Like [`profile_to_session_config`] with credentials already resolved.
pub fn build_session_config(
    profile: &Profile,
    defaults: &Defaults,
    server: url::Url,
    username: String,
    password: SecretString,
) -> SessionConfig {
    let mut config = SessionConfig::new(server, username, password);
    config.plaintext_auth = profile.plaintext_auth;
    config.accept_invalid_certs = profile.insecure.unwrap_or(false);
    config.timeout = Duration::from_millis(profile.timeout_ms.unwrap_or(defaults.timeout_ms));
    config.engine_timeout = Duration::from_millis(defaults.engine_timeout_ms);
    config.mpv_path = profile
        .mpv_path
        .clone()
        .unwrap_or_else(|| defaults.mpv_path.clone());
    config.scrobble = profile.scrobble.unwrap_or(defaults.scrobble);
    config
}

/// Parse a server URL, requiring http or https.
pub fn parse_server(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "server".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Validation {
            field: "server".into(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}
