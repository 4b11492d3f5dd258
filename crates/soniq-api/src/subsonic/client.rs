// Subsonic HTTP client
//
// Wraps `reqwest::Client` with Subsonic URL construction, per-request
// authentication and envelope decoding. Endpoint groups (browsing,
// playlists, media) are implemented as inherent methods in sibling files to
// keep this module focused on transport mechanics.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::subsonic::models::{Directory, Envelope, Response};
use crate::transport::TransportConfig;

/// Async client for one Subsonic-compatible server.
///
/// Holds the credentials, the HTTP client and a per-session cache of
/// directory listings. Safe to share behind an `Arc`; the cache is a
/// concurrent map and every other field is immutable after construction.
pub struct SubsonicClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    timeout_ms: u64,
    /// Directory id -> last successful `getMusicDirectory` response.
    /// Never invalidated within a session.
    pub(crate) directory_cache: DashMap<String, Response<Directory>>,
}

impl SubsonicClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the server root (e.g. `https://music.example.com`);
    /// endpoint paths are appended under `/rest/`.
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(
            http,
            base_url,
            credentials,
            transport.timeout_ms(),
        ))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// `timeout_ms` is only used for error reporting; the bound itself must
    /// already be configured on `http`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        credentials: Credentials,
        timeout_ms: u64,
    ) -> Self {
        Self {
            http,
            base_url,
            credentials,
            timeout_ms,
            directory_cache: DashMap::new(),
        }
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    /// Number of cached directory listings.
    pub fn cached_directories(&self) -> usize {
        self.directory_cache.len()
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/rest/{endpoint}` with auth and endpoint parameters.
    pub(crate) fn endpoint_url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/rest/{endpoint}"))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in self.credentials.query_pairs() {
                query.append_pair(key, &value);
            }
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the `subsonic-response` envelope.
    ///
    /// A `"failed"` status is returned as data. Only transport problems,
    /// non-2xx HTTP statuses and undecodable bodies are errors.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Response<T>, Error> {
        let url = self.endpoint_url(endpoint, params)?;
        // The query string carries auth material; log the endpoint only.
        debug!(endpoint, "GET");

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::from_send(e, endpoint, self.timeout_ms))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Http {
                endpoint: endpoint.to_owned(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::from_send(e, endpoint, self.timeout_ms))?;
        trace!(endpoint, bytes = body.len(), "response body received");

        parse_envelope(&body)
    }
}

/// Decode `{"subsonic-response": {...}}` into a [`Response`].
pub(crate) fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<Response<T>, Error> {
    let envelope: Envelope<T> = serde_json::from_str(body).map_err(|e| {
        let preview = body.char_indices().nth(200).map_or(body, |(i, _)| &body[..i]);
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })?;
    Ok(envelope.response.into())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use secrecy::SecretString;

    use super::*;
    use crate::subsonic::models::{NoPayload, Status};

    fn client(base: &str) -> SubsonicClient {
        SubsonicClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            Credentials::new("alice", SecretString::from("pw".to_owned())),
            200,
        )
    }

    #[test]
    fn endpoint_url_appends_rest_path() {
        let c = client("https://music.example.com/");
        let url = c.endpoint_url("getPlaylist", &[("id", "7")]).unwrap();
        assert_eq!(url.path(), "/rest/getPlaylist");
        let pairs: Vec<_> = url.query_pairs().collect();
        assert!(pairs.iter().any(|(k, v)| k == "id" && v == "7"));
        assert!(pairs.iter().any(|(k, v)| k == "f" && v == "json"));
    }

    #[test]
    fn endpoint_url_keeps_base_path_prefix() {
        let c = client("https://example.com/subsonic");
        let url = c.endpoint_url("ping", &[]).unwrap();
        assert_eq!(url.path(), "/subsonic/rest/ping");
    }

    #[test]
    fn failed_status_is_data() {
        let body = r#"{"subsonic-response":{"status":"failed","version":"1.15.0",
            "error":{"code":40,"message":"Wrong username or password"}}}"#;
        let resp: Response<NoPayload> = parse_envelope(body).unwrap();
        assert_eq!(resp.status, Status::Failed);
        let err = resp.error.unwrap();
        assert_eq!(err.code, 40);
    }

    #[test]
    fn malformed_body_is_deserialization_error() {
        let err = parse_envelope::<NoPayload>("<html>gateway</html>").unwrap_err();
        assert!(matches!(err, Error::Deserialization { ref body, .. } if body.contains("gateway")));
    }
}
