// ── Library -> queue ──
//
// Turns catalog entities into queue items. Directories expand recursively,
// depth-first, in catalog order.

use futures_util::future::BoxFuture;
use tracing::warn;

use soniq_api::{Entity, Playlist, SubsonicClient};

use crate::error::CoreError;
use crate::queue::{PlaybackQueue, QueueItem};

/// Build a queue item for a song. `fallback_artist` is used when the song
/// has no artist tag (typically the containing directory's name).
pub fn queue_item(client: &SubsonicClient, entity: &Entity, fallback_artist: &str) -> QueueItem {
    let artist = if entity.artist.is_empty() {
        fallback_artist
    } else {
        &entity.artist
    };
    QueueItem {
        uri: client.stream_url(entity),
        title: entity.display_title().to_owned(),
        artist: artist.to_owned(),
        duration: entity.duration,
        entity_id: entity.id.clone(),
    }
}

/// Append one song.
pub async fn enqueue_song(
    client: &SubsonicClient,
    queue: &PlaybackQueue,
    entity: &Entity,
    fallback_artist: &str,
) {
    queue.push(queue_item(client, entity, fallback_artist)).await;
}

/// Append every song under directory `id`, recursing into subdirectories.
///
/// The top-level listing must succeed. A failing subdirectory is logged
/// and skipped. Returns the number of songs added.
pub async fn enqueue_directory(
    client: &SubsonicClient,
    queue: &PlaybackQueue,
    id: &str,
) -> Result<usize, CoreError> {
    let items = collect_directory(client, id).await?;
    let count = items.len();
    queue.extend(items).await;
    Ok(count)
}

/// Every song under directory `id`, depth-first.
pub async fn collect_directory(
    client: &SubsonicClient,
    id: &str,
) -> Result<Vec<QueueItem>, CoreError> {
    let mut items = Vec::new();
    collect_into(client, id.to_owned(), true, &mut items).await?;
    Ok(items)
}

fn collect_into<'a>(
    client: &'a SubsonicClient,
    id: String,
    top_level: bool,
    items: &'a mut Vec<QueueItem>,
) -> BoxFuture<'a, Result<(), CoreError>> {
    Box::pin(async move {
        let resp = match client.get_music_directory(&id).await {
            Ok(resp) if resp.is_ok() => resp,
            Ok(resp) if top_level => return Err(CoreError::from_response(&resp)),
            Err(e) if top_level => return Err(e.into()),
            Ok(resp) => {
                warn!(id = %id, error = ?resp.error, "skipping subdirectory");
                return Ok(());
            }
            Err(e) => {
                warn!(id = %id, error = %e, "skipping subdirectory");
                return Ok(());
            }
        };

        let directory = resp.data;
        for entity in &directory.entities {
            if entity.is_directory {
                collect_into(client, entity.id.clone(), false, &mut *items).await?;
            } else {
                items.push(queue_item(client, entity, &directory.name));
            }
        }
        Ok(())
    })
}

/// Append a playlist's entries. Returns the number added.
pub async fn enqueue_playlist(
    client: &SubsonicClient,
    queue: &PlaybackQueue,
    playlist: &Playlist,
) -> usize {
    let items: Vec<_> = playlist
        .entries
        .iter()
        .filter(|e| !e.is_directory)
        .map(|e| queue_item(client, e, ""))
        .collect();
    let count = items.len();
    queue.extend(items).await;
    count
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use secrecy::SecretString;
    use soniq_api::{Credentials, TransportConfig};
    use url::Url;

    use super::*;

    fn client() -> SubsonicClient {
        SubsonicClient::new(
            Url::parse("http://music.local").unwrap(),
            Credentials::new("u", SecretString::from("p".to_owned())),
            &TransportConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn artist_falls_back_to_directory_name() {
        let client = client();
        let song = Entity {
            id: "s1".into(),
            title: "Track".into(),
            duration: 90,
            ..Entity::default()
        };
        let item = queue_item(&client, &song, "Some Band");
        assert_eq!(item.artist, "Some Band");
        assert_eq!(item.entity_id, "s1");
        assert_eq!(item.duration, 90);
        assert!(item.uri.contains("/rest/stream"));

        let tagged = Entity {
            artist: "Tagged".into(),
            ..song
        };
        assert_eq!(queue_item(&client, &tagged, "Some Band").artist, "Tagged");
    }

    #[test]
    fn untitled_song_uses_file_name() {
        let song = Entity {
            path: "Band/Album/03 - Untitled.mp3".into(),
            ..Entity::default()
        };
        assert_eq!(queue_item(&client(), &song, "").title, "03 - Untitled.mp3");
    }
}
