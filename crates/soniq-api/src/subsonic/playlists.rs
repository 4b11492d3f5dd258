// Playlist endpoints
//
// Mutations return the status envelope as-is; no local state is reconciled.

use tracing::debug;

use crate::error::Error;
use crate::subsonic::client::SubsonicClient;
use crate::subsonic::models::{
    NoPayload, Playlist, PlaylistPayload, Playlists, PlaylistsPayload, Response,
};

impl SubsonicClient {
    /// All playlists, each with its entries populated.
    ///
    /// `getPlaylists` only returns headers, so every playlist with a nonzero
    /// declared song count is fetched individually. If any of those fetches
    /// fails the whole call fails; no partially enriched list is returned.
    ///
    /// `GET /rest/getPlaylists`, then `GET /rest/getPlaylist?id=...` per playlist
    pub async fn get_playlists(&self) -> Result<Response<Playlists>, Error> {
        let mut resp = self
            .get::<PlaylistsPayload>("getPlaylists", &[])
            .await?
            .map(|p| p.playlists);

        for playlist in &mut resp.data.playlists {
            if playlist.song_count == 0 {
                continue;
            }
            debug!(id = %playlist.id, songs = playlist.song_count, "enriching playlist");
            let full = self.get_playlist(&playlist.id).await?;
            playlist.entries = full.data.entries;
        }
        Ok(resp)
    }

    /// One playlist with its entries.
    ///
    /// `GET /rest/getPlaylist?id=...`
    pub async fn get_playlist(&self, id: &str) -> Result<Response<Playlist>, Error> {
        let resp = self.get::<PlaylistPayload>("getPlaylist", &[("id", id)]).await?;
        Ok(resp.map(|p| p.playlist))
    }

    /// Create an empty playlist.
    ///
    /// `GET /rest/createPlaylist?name=...`
    pub async fn create_playlist(&self, name: &str) -> Result<Response<Playlist>, Error> {
        let resp = self
            .get::<PlaylistPayload>("createPlaylist", &[("name", name)])
            .await?;
        Ok(resp.map(|p| p.playlist))
    }

    /// `GET /rest/deletePlaylist?id=...`
    pub async fn delete_playlist(&self, id: &str) -> Result<Response<()>, Error> {
        let resp = self.get::<NoPayload>("deletePlaylist", &[("id", id)]).await?;
        Ok(resp.map(|_| ()))
    }

    /// Append a song to a playlist.
    ///
    /// `GET /rest/updatePlaylist?playlistId=...&songIdToAdd=...`
    pub async fn add_song_to_playlist(
        &self,
        playlist_id: &str,
        song_id: &str,
    ) -> Result<Response<()>, Error> {
        let resp = self
            .get::<NoPayload>(
                "updatePlaylist",
                &[("playlistId", playlist_id), ("songIdToAdd", song_id)],
            )
            .await?;
        Ok(resp.map(|_| ()))
    }

    /// Remove the song at `song_index` (position within the playlist).
    ///
    /// `GET /rest/updatePlaylist?playlistId=...&songIndexToRemove=...`
    pub async fn remove_song_from_playlist(
        &self,
        playlist_id: &str,
        song_index: usize,
    ) -> Result<Response<()>, Error> {
        let index = song_index.to_string();
        let resp = self
            .get::<NoPayload>(
                "updatePlaylist",
                &[("playlistId", playlist_id), ("songIndexToRemove", &index)],
            )
            .await?;
        Ok(resp.map(|_| ()))
    }
}
