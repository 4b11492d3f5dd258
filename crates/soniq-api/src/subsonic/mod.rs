// Subsonic REST API
//
// `/rest/<endpoint>` requests with per-request token auth and the
// `subsonic-response` JSON envelope.

pub mod browsing;
pub mod client;
pub mod media;
pub mod models;
pub mod playlists;

pub use browsing::RANDOM_SONGS_SIZE;
pub use client::SubsonicClient;
pub use models::{
    Artist, Directory, Entity, Index, Indexes, Playlist, Playlists, Response, ServerError, Songs,
    Starred, Status, entity_order, sort_entities,
};
