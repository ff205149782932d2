//! HTTP collaborators against mock servers

use geoflock::config::{RemoteConfig, SearchConfig};
use geoflock::remote::{HttpGraphClient, HttpSearchClient, RemoteError, SearchClient};
use geoflock::state::Cursor;
use geoflock::RemoteGraphClient;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn graph_client(server: &MockServer) -> HttpGraphClient {
    let config = RemoteConfig {
        base_url: format!("{}/1.1", server.uri()),
        token_env: "UNUSED".to_string(),
        user_agent: "geoflock-test/1.0".to_string(),
    };
    HttpGraphClient::new(&config, "test-token".to_string(), 50).unwrap()
}

#[tokio::test]
async fn test_fetch_account_decodes_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/users/show.json"))
        .and(query_param("screen_name", "alice"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "screen_name": "alice",
            "name": "Alice",
            "location": "Lima, Peru",
            "followers_count": 42,
            "protected": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let profile = graph_client(&server).fetch_account("alice").await.unwrap();

    assert_eq!(profile.identifier, "alice");
    assert_eq!(profile.location.as_deref(), Some("Lima, Peru"));
    assert_eq!(profile.follower_count, Some(42));
    assert!(!profile.is_protected());
}

#[tokio::test]
async fn test_followers_page_sends_cursor_and_reads_next() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/followers/list.json"))
        .and(query_param("screen_name", "alice"))
        .and(query_param("cursor", "1024"))
        .and(query_param("count", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [
                {"screen_name": "bob", "name": "Bob", "location": "Lima, Peru"},
                {"screen_name": "carol", "name": "Carol"}
            ],
            "next_cursor": 2048,
            "previous_cursor": 0
        })))
        .mount(&server)
        .await;

    let page = graph_client(&server)
        .fetch_connections_page("alice", Cursor::Next(1024))
        .await
        .unwrap();

    assert_eq!(page.accounts.len(), 2);
    assert_eq!(page.accounts[1].location, None);
    assert_eq!(page.next_cursor, Cursor::Next(2048));
}

#[tokio::test]
async fn test_followers_page_keeps_valid_users_beside_one_without_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/followers/list.json"))
        .and(query_param("screen_name", "alice"))
        .and(query_param("cursor", "-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [
                {"name": "No Id", "location": "Lima, Peru"},
                {"screen_name": "bob", "name": "Bob", "location": "Lima, Peru"}
            ],
            "next_cursor": 0
        })))
        .mount(&server)
        .await;

    let page = graph_client(&server)
        .fetch_connections_page("alice", Cursor::First)
        .await
        .unwrap();

    let ids: Vec<_> = page.accounts.iter().map(|a| a.identifier.as_str()).collect();
    assert_eq!(ids, vec!["", "bob"]);
    assert!(page.next_cursor.is_exhausted());
}

#[tokio::test]
async fn test_last_followers_page_is_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/followers/list.json"))
        .and(query_param("cursor", "-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"users": [], "next_cursor": 0})),
        )
        .mount(&server)
        .await;

    let page = graph_client(&server)
        .fetch_connections_page("alice", Cursor::First)
        .await
        .unwrap();

    assert!(page.accounts.is_empty());
    assert!(page.next_cursor.is_exhausted());
}

#[tokio::test]
async fn test_status_codes_map_to_error_variants() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/users/show.json"))
        .and(query_param("screen_name", "busy"))
        .respond_with(ResponseTemplate::new(429).insert_header("x-rate-limit-reset", "1700000000"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1.1/users/show.json"))
        .and(query_param("screen_name", "ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1.1/users/show.json"))
        .and(query_param("screen_name", "broken"))
        .respond_with(ResponseTemplate::new(503).set_body_string("over capacity"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1.1/users/show.json"))
        .and(query_param("screen_name", "garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = graph_client(&server);

    match client.fetch_account("busy").await {
        Err(RemoteError::RateLimited {
            reset_at: Some(reset_at),
        }) => assert_eq!(reset_at.timestamp(), 1_700_000_000),
        other => panic!("expected rate limit, got {:?}", other),
    }
    assert!(matches!(
        client.fetch_account("ghost").await,
        Err(RemoteError::NotFound(id)) if id == "ghost"
    ));
    assert!(matches!(
        client.fetch_account("broken").await,
        Err(RemoteError::Http { status: 503, .. })
    ));
    assert!(matches!(
        client.fetch_account("garbled").await,
        Err(RemoteError::Decode(_))
    ));
}

#[tokio::test]
async fn test_rate_limit_reset_from_status_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/application/rate_limit_status.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": {
                "followers": {
                    "/followers/list": {"limit": 15, "remaining": 0, "reset": 1700000600}
                },
                "users": {
                    "/users/show/:id": {"limit": 900, "remaining": 899, "reset": 1700000900}
                }
            }
        })))
        .mount(&server)
        .await;

    let reset = graph_client(&server).rate_limit_reset().await.unwrap();
    assert_eq!(reset.timestamp(), 1_700_000_600);
}

#[tokio::test]
async fn test_unreachable_remote_is_transport_error() {
    let config = RemoteConfig {
        base_url: "http://127.0.0.1:9/1.1".to_string(),
        token_env: "UNUSED".to_string(),
        user_agent: "geoflock-test/1.0".to_string(),
    };
    let client = HttpGraphClient::new(&config, "t".to_string(), 50).unwrap();

    let result = client.fetch_account("alice").await;
    assert!(matches!(result, Err(RemoteError::Transport(_))));
}

#[tokio::test]
async fn test_search_returns_ranked_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("key", "search-key"))
        .and(query_param("cx", "engine-1"))
        .and(query_param("q", "periodistas lima"))
        .and(query_param("lr", "lang_es"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"link": "https://twitter.com/rosa", "title": "Rosa (@rosa)"},
                {"link": "https://twitter.com/luis/status/1", "title": "Luis"}
            ]
        })))
        .mount(&server)
        .await;

    let config = SearchConfig {
        base_url: format!("{}/customsearch/v1", server.uri()),
        key_env: "UNUSED".to_string(),
        engine_id: "engine-1".to_string(),
        locale: "lang_es".to_string(),
    };
    let client =
        HttpSearchClient::new(&config, "search-key".to_string(), "geoflock-test/1.0").unwrap();

    let results = client.search("periodistas lima", "lang_es").await.unwrap();
    let ids: Vec<_> = results.iter().filter_map(|r| r.identifier()).collect();
    assert_eq!(ids, vec!["rosa", "luis"]);
}
