//! Library browsing command handlers.

use tabled::Tabled;

use soniq_api::{Artist, Entity, Playlist, SubsonicClient};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{self, format_duration};

use super::ok_data;

// ── Row types ────────────────────────────────────────────────────────

#[derive(Tabled)]
struct ArtistRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Albums")]
    albums: u32,
}

impl ArtistRow {
    fn new(a: &Artist) -> Self {
        Self {
            id: a.id.clone(),
            name: a.name.clone(),
            albums: a.album_count,
        }
    }
}

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "#")]
    track: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Artist")]
    artist: String,
    #[tabled(rename = "Length")]
    length: String,
}

impl EntityRow {
    fn new(e: &Entity) -> Self {
        let title = if e.is_directory {
            format!("{}/", e.display_title())
        } else {
            e.display_title().to_owned()
        };
        Self {
            id: e.id.clone(),
            track: if e.track > 0 {
                e.track.to_string()
            } else {
                String::new()
            },
            title,
            artist: e.artist.clone(),
            length: if e.is_directory {
                String::new()
            } else {
                format_duration(e.duration)
            },
        }
    }
}

#[derive(Tabled)]
struct PlaylistRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Songs")]
    songs: u32,
    #[tabled(rename = "Length")]
    length: String,
}

impl PlaylistRow {
    fn new(p: &Playlist) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            songs: p.song_count,
            length: format_duration(p.duration),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

pub async fn ping(client: &SubsonicClient, global: &GlobalOpts) -> Result<(), CliError> {
    let resp = client.ping().await?;
    let version = resp.version.clone();
    ok_data(resp)?;
    if !global.quiet {
        eprintln!(
            "Connected to {} as {} (API {version})",
            client.base_url(),
            client.username()
        );
    }
    Ok(())
}

pub async fn artists(client: &SubsonicClient, global: &GlobalOpts) -> Result<(), CliError> {
    let indexes = ok_data(client.get_indexes().await?)?;
    let artists: Vec<Artist> = indexes.artists().cloned().collect();
    let out = output::render_list(global.output, &artists, ArtistRow::new, |a| a.id.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn browse(
    client: &SubsonicClient,
    id: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let directory = ok_data(client.get_music_directory(id).await?)?;
    if global.output == OutputFormat::Table && !global.quiet {
        eprintln!("{}", directory.name);
    }
    print_entities(&directory.entities, global);
    Ok(())
}

pub async fn playlists(client: &SubsonicClient, global: &GlobalOpts) -> Result<(), CliError> {
    let playlists = ok_data(client.get_playlists().await?)?.playlists;
    let out = output::render_list(global.output, &playlists, PlaylistRow::new, |p| {
        p.id.clone()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn random(client: &SubsonicClient, global: &GlobalOpts) -> Result<(), CliError> {
    let songs = ok_data(client.get_random_songs().await?)?.songs;
    print_entities(&songs, global);
    Ok(())
}

pub async fn starred(client: &SubsonicClient, global: &GlobalOpts) -> Result<(), CliError> {
    let starred = ok_data(client.get_starred().await?)?;
    match global.output {
        OutputFormat::Json => {
            let out = serde_json::to_string_pretty(&starred).unwrap_or_default();
            output::print_output(&out, global.quiet);
        }
        OutputFormat::Plain => {
            let ids: Vec<&str> = starred.ids().collect();
            output::print_output(&ids.join("\n"), global.quiet);
        }
        OutputFormat::Table => {
            if !starred.artists.is_empty() {
                let out = output::render_list(global.output, &starred.artists, ArtistRow::new, |a| {
                    a.id.clone()
                });
                output::print_output(&out, global.quiet);
            }
            let mut entities = starred.albums;
            entities.extend(starred.songs);
            print_entities(&entities, global);
        }
    }
    Ok(())
}

fn print_entities(entities: &[Entity], global: &GlobalOpts) {
    let out = output::render_list(global.output, entities, EntityRow::new, |e| e.id.clone());
    output::print_output(&out, global.quiet);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_rows_are_marked() {
        let dir = Entity {
            id: "d1".into(),
            title: "Album".into(),
            is_directory: true,
            duration: 999,
            ..Entity::default()
        };
        let row = EntityRow::new(&dir);
        assert_eq!(row.title, "Album/");
        assert!(row.length.is_empty());
        assert!(row.track.is_empty());
    }

    #[test]
    fn song_rows_fall_back_to_path() {
        let song = Entity {
            id: "s1".into(),
            path: "Band/Album/01 Intro.flac".into(),
            track: 1,
            duration: 61,
            ..Entity::default()
        };
        let row = EntityRow::new(&song);
        assert_eq!(row.title, "01 Intro.flac");
        assert_eq!(row.track, "1");
        assert_eq!(row.length, "1:01");
    }
}
