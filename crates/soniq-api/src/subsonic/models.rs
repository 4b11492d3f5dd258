// Subsonic response types
//
// Every endpoint answers with the `{"subsonic-response": {...}}` envelope.
// Payload fields use `#[serde(default)]` liberally because servers differ in
// which keys they emit (Navidrome, Airsonic, Gonic, ...), and a failed
// response carries no payload at all.

use std::cmp::Ordering;

use serde::{Deserialize, Deserializer, Serialize};

// ── Response Envelope ────────────────────────────────────────────────

/// Outer wrapper: the payload lives under a single `subsonic-response` key.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(rename = "subsonic-response")]
    pub response: RawResponse<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawResponse<T> {
    pub status: Status,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub error: Option<ServerError>,
    #[serde(flatten)]
    pub body: T,
}

/// Response status. Anything other than `"ok"` is treated as failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    #[serde(other)]
    Failed,
}

/// Error detail attached to a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// A decoded server response.
///
/// A failed status is data, not an `Err`: the caller decides what a
/// `"failed"` answer means for the operation at hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response<T> {
    pub status: Status,
    pub version: String,
    pub error: Option<ServerError>,
    pub data: T,
}

impl<T> Response<T> {
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    pub(crate) fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            status: self.status,
            version: self.version,
            error: self.error,
            data: f(self.data),
        }
    }
}

impl<T> From<RawResponse<T>> for Response<T> {
    fn from(raw: RawResponse<T>) -> Self {
        Self {
            status: raw.status,
            version: raw.version,
            error: raw.error,
            data: raw.body,
        }
    }
}

// ── Identifiers ──────────────────────────────────────────────────────

/// Some servers send numeric ids (`"id": 42`), others strings (`"id": "42"`).
/// Both decode to the same `String`.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        UInt(u64),
        Null,
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::UInt(n) => n.to_string(),
        Raw::Null => String::new(),
    })
}

// ── Entities ─────────────────────────────────────────────────────────

/// A catalog node: either a directory or a playable track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub parent: String,
    #[serde(default, rename = "isDir")]
    pub is_directory: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    /// Seconds.
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub track: u32,
    #[serde(default, alias = "discNumber")]
    pub disk_number: u32,
    #[serde(default)]
    pub path: String,
}

impl Entity {
    /// Title for display, falling back to the file name from `path`.
    ///
    /// A path ending in `/` yields an empty title.
    pub fn display_title(&self) -> &str {
        if !self.title.is_empty() {
            return &self.title;
        }
        if self.path.is_empty() || self.path.ends_with('/') {
            return "";
        }
        match self.path.rfind('/') {
            Some(idx) => &self.path[idx + 1..],
            None => &self.path,
        }
    }
}

/// Catalog order: directories first (by title), then files by track number,
/// then by title. Files without track numbers all compare equal on track and
/// fall through to title order.
pub fn entity_order(a: &Entity, b: &Entity) -> Ordering {
    match (a.is_directory, b.is_directory) {
        (true, true) => a.title.cmp(&b.title),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.track.cmp(&b.track).then_with(|| a.title.cmp(&b.title)),
    }
}

/// Sort entities in catalog order (stable).
pub fn sort_entities(entities: &mut [Entity]) {
    entities.sort_by(entity_order);
}

/// A catalog container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub parent: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "child")]
    pub entities: Vec<Entity>,
}

impl Directory {
    pub fn has_parent(&self) -> bool {
        !self.parent.is_empty()
    }
}

// ── Artist index ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub album_count: u32,
}

/// One leading-character bucket of the artist index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "artist")]
    pub artists: Vec<Artist>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indexes {
    #[serde(default, rename = "index")]
    pub buckets: Vec<Index>,
}

impl Indexes {
    /// All artists, bucket by bucket, in server order.
    pub fn artists(&self) -> impl Iterator<Item = &Artist> {
        self.buckets.iter().flat_map(|b| b.artists.iter())
    }
}

// ── Playlists ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub song_count: u32,
    #[serde(default)]
    pub duration: u32,
    /// Empty until the playlist is fetched individually.
    #[serde(default, rename = "entry")]
    pub entries: Vec<Entity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlists {
    #[serde(default, rename = "playlist")]
    pub playlists: Vec<Playlist>,
}

// ── Starred / random ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Starred {
    #[serde(default, rename = "artist")]
    pub artists: Vec<Artist>,
    #[serde(default, rename = "album")]
    pub albums: Vec<Entity>,
    #[serde(default, rename = "song")]
    pub songs: Vec<Entity>,
}

impl Starred {
    /// Ids of every starred item, for seeding a local starred set.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.artists
            .iter()
            .map(|a| a.id.as_str())
            .chain(self.albums.iter().map(|e| e.id.as_str()))
            .chain(self.songs.iter().map(|e| e.id.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Songs {
    #[serde(default, rename = "song")]
    pub songs: Vec<Entity>,
}

// ── Endpoint payload shapes (keyed fields inside the envelope) ──────

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NoPayload {}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IndexesPayload {
    #[serde(default)]
    pub indexes: Indexes,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DirectoryPayload {
    #[serde(default)]
    pub directory: Directory,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PlaylistsPayload {
    #[serde(default)]
    pub playlists: Playlists,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PlaylistPayload {
    #[serde(default)]
    pub playlist: Playlist,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RandomSongsPayload {
    #[serde(default, rename = "randomSongs")]
    pub random_songs: Songs,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StarredPayload {
    #[serde(default)]
    pub starred: Starred,
}
