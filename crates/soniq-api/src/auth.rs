// Subsonic token authentication.
//
// Every request carries its own credentials. By default the password never
// leaves the process: a fresh salt is drawn per request and only
// `md5(password + salt)` is transmitted. Servers backed by LDAP cannot verify
// tokens, so a profile may opt into sending the password itself.

use md5::{Digest, Md5};
use rand::Rng;
use rand::distr::Alphabetic;
use secrecy::{ExposeSecret, SecretString};

/// Protocol version sent as `v`.
pub const PROTOCOL_VERSION: &str = "1.15.0";

/// Client identifier sent as `c`.
pub const CLIENT_NAME: &str = "soniq";

const SALT_LEN: usize = 8;

/// Credentials for a Subsonic server. Immutable once a client is built.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    /// Send the password as `p` instead of a salted token.
    pub plaintext_auth: bool,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            plaintext_auth: false,
        }
    }

    pub fn with_plaintext_auth(mut self, plaintext: bool) -> Self {
        self.plaintext_auth = plaintext;
        self
    }

    /// The common query parameters, with freshly derived auth material.
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("u", self.username.clone())];
        if self.plaintext_auth {
            pairs.push(("p", self.password.expose_secret().to_owned()));
        } else {
            let salt = random_salt();
            pairs.push(("t", token(self.password.expose_secret(), &salt)));
            pairs.push(("s", salt));
        }
        pairs.push(("v", PROTOCOL_VERSION.to_owned()));
        pairs.push(("c", CLIENT_NAME.to_owned()));
        pairs.push(("f", "json".to_owned()));
        pairs
    }
}

/// Eight random ASCII letters.
pub(crate) fn random_salt() -> String {
    rand::rng()
        .sample_iter(Alphabetic)
        .take(SALT_LEN)
        .map(char::from)
        .collect()
}

/// `hex(md5(password + salt))`
pub(crate) fn token(password: &str, salt: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}
