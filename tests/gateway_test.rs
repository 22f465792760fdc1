use std::sync::Arc;

use async_trait::async_trait;
use mockito::Matcher;
use serde_json::json;
use spotlite::management::{AuthError, TokenSource};
use spotlite::spotify::gateway::{ApiError, RequestGateway};
use spotlite::types::{SearchResult, Track};

struct StaticToken(Result<String, AuthError>);

#[async_trait]
impl TokenSource for StaticToken {
    async fn valid_token(&self) -> Result<String, AuthError> {
        self.0.clone()
    }
}

fn gateway(server: &mockito::ServerGuard) -> RequestGateway {
    RequestGateway::new(
        Arc::new(StaticToken(Ok("test-token".to_string()))),
        reqwest::Client::new(),
        &server.url(),
    )
}

fn track(id: &str) -> Track {
    serde_json::from_value(json!({ "id": id, "name": "Song" })).unwrap()
}

#[tokio::test]
async fn test_requests_carry_bearer_token_and_decode() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/browse/new-releases")
        .match_header("authorization", "Bearer test-token")
        .match_query(Matcher::UrlEncoded("limit".into(), "2".into()))
        .with_status(200)
        .with_body(
            json!({
                "albums": { "items": [
                    { "id": "al1", "name": "First", "release_date": "2024-05-01" },
                    { "id": "al2", "name": "Second" }
                ]}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let albums = gateway(&server).new_releases(2).await.unwrap();

    let names: Vec<&str> = albums.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Second"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_undecodable_body_is_decode_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/me")
        .with_status(200)
        .with_body("{\"unexpected\": true}")
        .create_async()
        .await;

    let err = gateway(&server).current_user_profile().await.unwrap_err();

    match err {
        ApiError::Decode { endpoint, .. } => assert_eq!(endpoint, "/me"),
        other => panic!("expected a decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_status_is_reported_with_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/albums/missing")
        .with_status(404)
        .with_body("{\"error\":{\"status\":404,\"message\":\"Not found.\"}}")
        .create_async()
        .await;

    let err = gateway(&server).album_details("missing").await.unwrap_err();

    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("Not found."));
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/browse/categories")
        .match_query(Matcher::UrlEncoded("limit".into(), "10".into()))
        .with_status(429)
        .with_header("retry-after", "7")
        .expect(1)
        .create_async()
        .await;

    let err = gateway(&server).categories(10).await.unwrap_err();

    assert!(matches!(
        err,
        ApiError::RateLimited {
            retry_after: Some(7)
        }
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_token_stops_before_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/me")
        .expect(0)
        .create_async()
        .await;
    let gateway = RequestGateway::new(
        Arc::new(StaticToken(Err(AuthError::SignedOut))),
        reqwest::Client::new(),
        &server.url(),
    );

    let err = gateway.current_user_profile().await.unwrap_err();

    assert!(matches!(err, ApiError::Auth(AuthError::SignedOut)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_save_album_requires_ok_status() {
    let mut server = mockito::Server::new_async().await;
    let saved = server
        .mock("PUT", "/me/albums")
        .match_query(Matcher::UrlEncoded("ids".into(), "al1".into()))
        .with_status(200)
        .create_async()
        .await;
    server
        .mock("PUT", "/me/albums")
        .match_query(Matcher::UrlEncoded("ids".into(), "al2".into()))
        .with_status(202)
        .create_async()
        .await;
    let gateway = gateway(&server);

    assert!(gateway.save_album("al1").await.is_ok());
    assert!(matches!(
        gateway.save_album("al2").await,
        Err(ApiError::Rejected(_))
    ));
    saved.assert_async().await;
}

#[tokio::test]
async fn test_create_playlist_uses_profile_id() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/me")
        .with_status(200)
        .with_body(json!({ "id": "user-1", "display_name": "User" }).to_string())
        .create_async()
        .await;
    let create = server
        .mock("POST", "/users/user-1/playlists")
        .match_body(Matcher::Json(json!({ "name": "Road trip" })))
        .with_status(201)
        .with_body(
            json!({ "id": "pl1", "name": "Road trip", "owner": { "id": "user-1" } }).to_string(),
        )
        .create_async()
        .await;

    let playlist = gateway(&server).create_playlist("Road trip").await.unwrap();

    assert_eq!(playlist.id, "pl1");
    assert_eq!(playlist.owner.id, "user-1");
    create.assert_async().await;
}

#[tokio::test]
async fn test_create_playlist_without_id_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/me")
        .with_status(200)
        .with_body(json!({ "id": "user-1" }).to_string())
        .create_async()
        .await;
    server
        .mock("POST", "/users/user-1/playlists")
        .with_status(201)
        .with_body(json!({ "name": "Road trip" }).to_string())
        .create_async()
        .await;

    let err = gateway(&server).create_playlist("Road trip").await.unwrap_err();

    assert!(matches!(err, ApiError::Rejected(_)));
}

#[tokio::test]
async fn test_playlist_edits_return_snapshot_id() {
    let mut server = mockito::Server::new_async().await;
    let add = server
        .mock("POST", "/playlists/pl1/tracks")
        .match_body(Matcher::Json(json!({ "uris": ["spotify:track:t1"] })))
        .with_status(201)
        .with_body(json!({ "snapshot_id": "snap-1" }).to_string())
        .create_async()
        .await;
    let remove = server
        .mock("DELETE", "/playlists/pl1/tracks")
        .match_body(Matcher::Json(
            json!({ "tracks": [{ "uri": "spotify:track:t1" }] }),
        ))
        .with_status(200)
        .with_body(json!({ "snapshot_id": "snap-2" }).to_string())
        .create_async()
        .await;
    let gateway = gateway(&server);
    let track = track("t1");

    assert_eq!(
        gateway.add_track_to_playlist(&track, "pl1").await.unwrap(),
        "snap-1"
    );
    assert_eq!(
        gateway
            .remove_track_from_playlist(&track, "pl1")
            .await
            .unwrap(),
        "snap-2"
    );
    add.assert_async().await;
    remove.assert_async().await;
}

#[tokio::test]
async fn test_playlist_edit_without_snapshot_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/playlists/pl1/tracks")
        .with_status(201)
        .with_body("{}")
        .create_async()
        .await;

    let err = gateway(&server)
        .add_track_to_playlist(&track("t1"), "pl1")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Rejected(_)));
}

#[tokio::test]
async fn test_search_sends_all_types() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "daft punk".into()),
            Matcher::UrlEncoded("type".into(), "album,artist,playlist,track".into()),
            Matcher::UrlEncoded("limit".into(), "5".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "albums": { "items": [{ "id": "al1", "name": "Discovery" }] },
                "artists": { "items": [{ "id": "ar1", "name": "Daft Punk" }] },
                "playlists": { "items": [null] },
                "tracks": { "items": [{ "id": "t1", "name": "One More Time" }] }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let results = gateway(&server).search("daft punk", 5).await.unwrap();

    assert_eq!(results.len(), 3);
    assert!(matches!(&results[0], SearchResult::Track(t) if t.id == "t1"));
    assert!(matches!(&results[2], SearchResult::Artist(a) if a.id == "ar1"));
}

#[tokio::test]
async fn test_home_feed_tolerates_missing_recommendations() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/browse/new-releases")
        .match_query(Matcher::UrlEncoded("limit".into(), "50".into()))
        .with_status(200)
        .with_body(
            json!({ "albums": { "items": [
                { "id": "al1", "name": "First" },
                { "id": "al1", "name": "First" }
            ]}})
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/browse/featured-playlists")
        .match_query(Matcher::UrlEncoded("limit".into(), "10".into()))
        .with_status(200)
        .with_body(
            json!({ "playlists": { "items": [
                { "id": "pl1", "name": "Mix", "owner": { "id": "spotify" } }
            ]}})
            .to_string(),
        )
        .create_async()
        .await;
    let seeds = server
        .mock("GET", "/recommendations/available-genre-seeds")
        .with_status(404)
        .create_async()
        .await;

    let feed = gateway(&server).home_feed().await.unwrap();

    assert_eq!(feed.new_releases.len(), 1);
    assert_eq!(feed.featured_playlists.len(), 1);
    assert!(feed.recommended_tracks.is_empty());
    seeds.assert_async().await;
}

#[tokio::test]
async fn test_recommendations_are_seeded_by_genre() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/recommendations/available-genre-seeds")
        .with_status(200)
        .with_body(json!({ "genres": ["house"] }).to_string())
        .create_async()
        .await;
    let recommend = server
        .mock("GET", "/recommendations")
        .match_query(Matcher::UrlEncoded("seed_genres".into(), "house".into()))
        .with_status(200)
        .with_body(json!({ "tracks": [{ "id": "t9", "name": "Groove" }] }).to_string())
        .create_async()
        .await;

    let tracks = gateway(&server).recommended_tracks(10).await.unwrap();

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, "t9");
    recommend.assert_async().await;
}
