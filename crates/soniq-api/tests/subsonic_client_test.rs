#![allow(clippy::unwrap_used)]
// Integration tests for `SubsonicClient` using wiremock.

use std::collections::HashSet;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use soniq_api::{Credentials, Entity, Error, Status, SubsonicClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

fn credentials() -> Credentials {
    Credentials::new("alice", SecretString::from("sesame".to_owned()))
}

async fn setup() -> (MockServer, SubsonicClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = SubsonicClient::new(base_url, credentials(), &TransportConfig::default()).unwrap();
    (server, client)
}

fn ok(body: Value) -> Value {
    let mut inner = json!({ "status": "ok", "version": "1.16.1" });
    if let (Some(target), Some(extra)) = (inner.as_object_mut(), body.as_object()) {
        for (k, v) in extra {
            target.insert(k.clone(), v.clone());
        }
    }
    json!({ "subsonic-response": inner })
}

fn failed(code: i32, message: &str) -> Value {
    json!({
        "subsonic-response": {
            "status": "failed",
            "version": "1.16.1",
            "error": { "code": code, "message": message }
        }
    })
}

fn ok_empty() -> Value {
    ok(json!({}))
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_ping_sends_token_auth() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/ping"))
        .and(query_param("u", "alice"))
        .and(query_param("v", "1.15.0"))
        .and(query_param("c", "soniq"))
        .and(query_param("f", "json"))
        .and(query_param_is_missing("p"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_empty()))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client.ping().await.unwrap();
    assert!(resp.is_ok());
    assert_eq!(resp.version, "1.16.1");

    let requests = server.received_requests().await.unwrap();
    let url = &requests[0].url;
    let token = url.query_pairs().find(|(k, _)| k == "t").unwrap().1;
    let salt = url.query_pairs().find(|(k, _)| k == "s").unwrap().1;
    assert_eq!(token.len(), 32);
    assert_eq!(salt.len(), 8);
    assert!(salt.chars().all(|c| c.is_ascii_alphabetic()));
}

#[tokio::test]
async fn test_plaintext_auth_sends_password() {
    let server = MockServer::start().await;
    let client = SubsonicClient::new(
        Url::parse(&server.uri()).unwrap(),
        credentials().with_plaintext_auth(true),
        &TransportConfig::default(),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/ping"))
        .and(query_param("p", "sesame"))
        .and(query_param_is_missing("t"))
        .and(query_param_is_missing("s"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_empty()))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.ping().await.unwrap().is_ok());
}

#[tokio::test]
async fn test_failed_status_is_returned_as_data() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/ping"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(failed(40, "Wrong username or password")),
        )
        .mount(&server)
        .await;

    let resp = client.ping().await.unwrap();
    assert_eq!(resp.status, Status::Failed);
    assert_eq!(resp.error.unwrap().code, 40);
}

// ── Failure policy ──────────────────────────────────────────────────

#[tokio::test]
async fn test_slow_server_maps_to_timeout() {
    let server = MockServer::start().await;
    let transport = TransportConfig::default().with_timeout(Duration::from_millis(50));
    let client =
        SubsonicClient::new(Url::parse(&server.uri()).unwrap(), credentials(), &transport).unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/ping"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_empty())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let result = client.ping().await;
    assert!(
        matches!(result, Err(Error::Timeout { timeout_ms: 50, .. })),
        "expected Timeout, got: {result:?}"
    );
    assert!(result.unwrap_err().is_timeout());
}

#[tokio::test]
async fn test_unreachable_server_maps_to_transport() {
    // Reserve a free port, then release it so nothing is listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let base_url = Url::parse(&format!("http://127.0.0.1:{port}")).unwrap();

    let client = SubsonicClient::new(base_url, credentials(), &TransportConfig::default()).unwrap();
    let result = client.ping().await;
    assert!(
        matches!(result, Err(Error::Transport(_))),
        "expected Transport, got: {result:?}"
    );
}

#[tokio::test]
async fn test_http_error_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/ping"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let result = client.ping().await;
    assert!(
        matches!(result, Err(Error::Http { status: 502, .. })),
        "expected Http 502, got: {result:?}"
    );
}

#[tokio::test]
async fn test_malformed_json_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/getIndexes"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"subsonic-response\": ["))
        .mount(&server)
        .await;

    let result = client.get_indexes().await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization, got: {result:?}"
    );
}

// ── Browsing ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_indexes_preserves_server_order() {
    let (server, client) = setup().await;

    let body = ok(json!({
        "indexes": {
            "index": [
                { "name": "Z", "artist": [
                    { "id": "3", "name": "Zappa", "albumCount": 12 },
                    { "id": "1", "name": "Zed" }
                ]},
                { "name": "A", "artist": [
                    { "id": 2, "name": "Abba", "albumCount": 8 }
                ]}
            ]
        }
    }));

    Mock::given(method("GET"))
        .and(path("/rest/getIndexes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let resp = client.get_indexes().await.unwrap();
    let buckets: Vec<_> = resp.data.buckets.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(buckets, ["Z", "A"]);

    let artists: Vec<_> = resp.data.artists().map(|a| a.name.as_str()).collect();
    assert_eq!(artists, ["Zappa", "Zed", "Abba"]);

    let abba = resp.data.artists().find(|a| a.name == "Abba").unwrap();
    assert_eq!(abba.id, "2");
    assert_eq!(abba.album_count, 8);
}

fn directory_body() -> Value {
    ok(json!({
        "directory": {
            "id": "10",
            "parent": "1",
            "name": "Album",
            "child": [
                { "id": "a", "title": "Song B", "isDir": false, "track": 2 },
                { "id": "b", "title": "Disc 2", "isDir": true },
                { "id": "c", "title": "Song A", "isDir": false, "track": 2 },
                { "id": "d", "title": "Bonus", "isDir": false, "track": 1 },
                { "id": "e", "title": "Artwork", "isDir": true }
            ]
        }
    }))
}

#[tokio::test]
async fn test_get_music_directory_sorts_entities() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/getMusicDirectory"))
        .and(query_param("id", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(directory_body()))
        .mount(&server)
        .await;

    let resp = client.get_music_directory("10").await.unwrap();
    let titles: Vec<_> = resp.data.entities.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Artwork", "Disc 2", "Bonus", "Song A", "Song B"]);
    assert_eq!(resp.data.name, "Album");
    assert!(resp.data.has_parent());
}

#[tokio::test]
async fn test_get_music_directory_is_cached() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/getMusicDirectory"))
        .and(query_param("id", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(directory_body()))
        .expect(1)
        .mount(&server)
        .await;

    let first = client.get_music_directory("10").await.unwrap();
    let second = client.get_music_directory("10").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(client.cached_directories(), 1);
}

#[tokio::test]
async fn test_failed_directory_is_not_cached() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/getMusicDirectory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(failed(70, "Directory not found")))
        .expect(2)
        .mount(&server)
        .await;

    assert!(!client.get_music_directory("404").await.unwrap().is_ok());
    assert!(!client.get_music_directory("404").await.unwrap().is_ok());
    assert_eq!(client.cached_directories(), 0);
}

#[tokio::test]
async fn test_get_random_songs_requests_fifty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/getRandomSongs"))
        .and(query_param("size", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "randomSongs": { "song": [
                { "id": 101, "title": "One", "artist": "X", "duration": 180 },
                { "id": "102", "title": "Two" }
            ]}
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client.get_random_songs().await.unwrap();
    let ids: Vec<_> = resp.data.songs.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["101", "102"]);
    assert_eq!(resp.data.songs[0].duration, 180);
}

#[tokio::test]
async fn test_get_starred() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/getStarred"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "starred": {
                "artist": [{ "id": "ar1", "name": "Band" }],
                "song": [{ "id": "s1", "title": "Hit" }]
            }
        }))))
        .mount(&server)
        .await;

    let resp = client.get_starred().await.unwrap();
    let ids: Vec<_> = resp.data.ids().collect();
    assert_eq!(ids, ["ar1", "s1"]);
}

// ── Playlists ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_playlists_enriches_non_empty_playlists() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/getPlaylists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "playlists": { "playlist": [
                { "id": 1, "name": "Road trip", "songCount": 2 },
                { "id": 2, "name": "Empty", "songCount": 0 }
            ]}
        }))))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/getPlaylist"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "playlist": { "id": 1, "name": "Road trip", "songCount": 2, "entry": [
                { "id": "s1", "title": "Drive" },
                { "id": "s2", "title": "Highway" }
            ]}
        }))))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/getPlaylist"))
        .and(query_param("id", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_empty()))
        .expect(0)
        .mount(&server)
        .await;

    let resp = client.get_playlists().await.unwrap();
    let lists = &resp.data.playlists;
    assert_eq!(lists.len(), 2);
    assert_eq!(lists[0].entries.len(), 2);
    assert_eq!(lists[0].entries[1].title, "Highway");
    assert!(lists[1].entries.is_empty());
}

#[tokio::test]
async fn test_get_playlists_aborts_when_enrichment_fails() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/getPlaylists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "playlists": { "playlist": [
                { "id": "1", "name": "Good", "songCount": 1 },
                { "id": "2", "name": "Broken", "songCount": 3 }
            ]}
        }))))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/getPlaylist"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "playlist": { "id": "1", "entry": [{ "id": "s1" }] }
        }))))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/getPlaylist"))
        .and(query_param("id", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client.get_playlists().await;
    assert!(
        matches!(result, Err(Error::Http { status: 500, .. })),
        "expected the whole call to fail, got: {result:?}"
    );
}

#[tokio::test]
async fn test_playlist_mutations() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/createPlaylist"))
        .and(query_param("name", "New mix"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "playlist": { "id": "9", "name": "New mix", "songCount": 0 }
        }))))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/updatePlaylist"))
        .and(query_param("playlistId", "9"))
        .and(query_param("songIdToAdd", "s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_empty()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/updatePlaylist"))
        .and(query_param("playlistId", "9"))
        .and(query_param("songIndexToRemove", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_empty()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/deletePlaylist"))
        .and(query_param("id", "9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_empty()))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.create_playlist("New mix").await.unwrap();
    assert_eq!(created.data.id, "9");
    assert!(client.add_song_to_playlist("9", "s1").await.unwrap().is_ok());
    assert!(client.remove_song_from_playlist("9", 0).await.unwrap().is_ok());
    assert!(client.delete_playlist("9").await.unwrap().is_ok());
}

// ── Media ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_toggle_star_stars_and_unstars() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/star"))
        .and(query_param("id", "s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_empty()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/unstar"))
        .and(query_param("id", "s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_empty()))
        .expect(1)
        .mount(&server)
        .await;

    let mut starred = HashSet::new();
    client.toggle_star("s1", &mut starred).await.unwrap();
    assert!(starred.contains("s1"));
    client.toggle_star("s1", &mut starred).await.unwrap();
    assert!(!starred.contains("s1"));
}

#[tokio::test]
async fn test_toggle_star_flips_set_on_failure() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/star"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut starred = HashSet::new();
    let result = client.toggle_star("s1", &mut starred).await;
    assert!(result.is_err());
    assert!(starred.contains("s1"));
}

#[tokio::test]
async fn test_scrobble_parameters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/scrobble"))
        .and(query_param("id", "s1"))
        .and(query_param("submission", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_empty()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/scrobble"))
        .and(query_param("id", "s1"))
        .and(query_param("submission", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_empty()))
        .expect(1)
        .mount(&server)
        .await;

    client.scrobble("s1", true).await.unwrap();
    client.scrobble("s1", false).await.unwrap();
}

#[tokio::test]
async fn test_stream_url() {
    let (server, client) = setup().await;

    let song = Entity {
        id: "s1".into(),
        title: "Song".into(),
        ..Entity::default()
    };
    let url = Url::parse(&client.stream_url(&song)).unwrap();
    assert!(url.as_str().starts_with(&server.uri()));
    assert_eq!(url.path(), "/rest/stream");
    assert!(url.query_pairs().any(|(k, v)| k == "id" && v == "s1"));

    let dir = Entity {
        is_directory: true,
        ..song
    };
    assert_eq!(client.stream_url(&dir), "");

    // Nothing is requested.
    assert!(server.received_requests().await.unwrap().is_empty());
}
