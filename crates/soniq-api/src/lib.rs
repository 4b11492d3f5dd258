// soniq-api: Async Rust client for Subsonic-compatible media server APIs

pub mod auth;
pub mod error;
pub mod subsonic;
pub mod transport;

pub use auth::Credentials;
pub use error::Error;
pub use subsonic::{
    Artist, Directory, Entity, Index, Indexes, Playlist, Playlists, Response, ServerError, Songs,
    Starred, Status, SubsonicClient,
};
pub use transport::TransportConfig;
