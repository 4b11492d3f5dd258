// Catalog browsing endpoints
//
// Artist index, directory listings (cached), random songs and starred items.

use tracing::debug;

use crate::error::Error;
use crate::subsonic::client::SubsonicClient;
use crate::subsonic::models::{
    Directory, DirectoryPayload, Indexes, IndexesPayload, NoPayload, RandomSongsPayload, Response,
    Songs, Starred, StarredPayload, sort_entities,
};

/// Number of songs requested from `getRandomSongs` (the server default is 10).
pub const RANDOM_SONGS_SIZE: u32 = 50;

impl SubsonicClient {
    /// Confirm the server is reachable and the credentials are accepted.
    ///
    /// `GET /rest/ping`
    pub async fn ping(&self) -> Result<Response<()>, Error> {
        let resp = self.get::<NoPayload>("ping", &[]).await?;
        Ok(resp.map(|_| ()))
    }

    /// Full artist index, grouped by leading-character bucket.
    ///
    /// Bucket and artist order are exactly as the server sent them.
    ///
    /// `GET /rest/getIndexes`
    pub async fn get_indexes(&self) -> Result<Response<Indexes>, Error> {
        let resp = self.get::<IndexesPayload>("getIndexes", &[]).await?;
        Ok(resp.map(|p| p.indexes))
    }

    /// List a directory, sorted directories-first.
    ///
    /// Successful answers are cached by id for the life of the client;
    /// a cache hit makes no network call. Failed answers are returned but
    /// not cached, so the next call asks the server again.
    ///
    /// `GET /rest/getMusicDirectory?id=...`
    pub async fn get_music_directory(&self, id: &str) -> Result<Response<Directory>, Error> {
        if let Some(cached) = self.directory_cache.get(id) {
            debug!(id, "directory cache hit");
            return Ok(cached.clone());
        }

        let resp = self
            .get::<DirectoryPayload>("getMusicDirectory", &[("id", id)])
            .await?;
        let mut resp = resp.map(|p| p.directory);
        sort_entities(&mut resp.data.entities);

        if resp.is_ok() {
            self.directory_cache.insert(id.to_owned(), resp.clone());
        }
        Ok(resp)
    }

    /// Fifty random songs from the whole library.
    ///
    /// `GET /rest/getRandomSongs?size=50`
    pub async fn get_random_songs(&self) -> Result<Response<Songs>, Error> {
        let size = RANDOM_SONGS_SIZE.to_string();
        let resp = self
            .get::<RandomSongsPayload>("getRandomSongs", &[("size", &size)])
            .await?;
        Ok(resp.map(|p| p.random_songs))
    }

    /// Starred artists, albums and songs.
    ///
    /// `GET /rest/getStarred`
    pub async fn get_starred(&self) -> Result<Response<Starred>, Error> {
        let resp = self.get::<StarredPayload>("getStarred", &[]).await?;
        Ok(resp.map(|p| p.starred))
    }
}
