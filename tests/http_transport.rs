mod common;

use common::http::{Reply, TestServer};
use pokedex_explorer::{
    AppError, CacheConfig, HttpTransport, PokeApiClient, PokemonConfig, QueryKey, Transport,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn transport(timeout: u32) -> HttpTransport {
    let pokemon = PokemonConfig {
        api_url: String::new(),
        timeout,
        cache_enabled: true,
    };
    let cache = CacheConfig {
        r#type: "memory".to_string(),
        max_size: 100,
        expiration: 3600,
    };
    HttpTransport::new(&pokemon, &cache).unwrap()
}

async fn pokeapi() -> TestServer {
    TestServer::start(|target| match target {
        "/pokemon/pikachu" => Reply::json(json!({"id": 25, "name": "pikachu"})),
        "/pokemon/snorlax" => Reply::status(503),
        "/pokemon/ditto" => Reply::html("<html><body>Down for maintenance</body></html>"),
        "/pokemon/slowpoke" => Reply::json(json!({"id": 79})).delayed(Duration::from_secs(3)),
        "/cries/25.ogg" => Reply::bytes("audio/ogg", "OggS"),
        _ => Reply::status(404),
    })
    .await
}

#[tokio::test]
async fn test_json_response_served_from_cache() {
    let server = pokeapi().await;
    let transport = transport(5);
    let url = server.url("pokemon/pikachu");

    let first = transport.get_json(&url).await.unwrap();
    let second = transport.get_json(&url).await.unwrap();

    assert_eq!(first["name"], "pikachu");
    assert_eq!(first, second);
    assert_eq!(server.hits(), 1);
    let cache = transport.cache().unwrap();
    assert_eq!(cache.size(), 1);
    assert_eq!(cache.stats().hits, 1);
}

#[tokio::test]
async fn test_error_statuses_map_to_error_kinds() {
    let server = pokeapi().await;
    let transport = transport(5);

    let err = transport.get_json(&server.url("pokemon/missingno")).await.unwrap_err();
    assert!(err.is_not_found(), "got {:?}", err);

    let err = transport.get_json(&server.url("pokemon/snorlax")).await.unwrap_err();
    assert!(matches!(err, AppError::Unavailable(_)), "got {:?}", err);

    let err = transport.get_json(&server.url("pokemon/ditto")).await.unwrap_err();
    assert!(matches!(err, AppError::Malformed(_)), "got {:?}", err);

    let cache = transport.cache().unwrap();
    assert_eq!(cache.size(), 0);
    assert_eq!(cache.stats().inserts, 0);
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let server = pokeapi().await;
    let transport = transport(5);

    transport.get_json(&server.url("pokemon/pikachu")).await.unwrap();
    for _ in 0..2 {
        assert!(transport.get_json(&server.url("pokemon/snorlax")).await.is_err());
    }

    assert_eq!(server.hits(), 3);
    assert_eq!(transport.cache().unwrap().size(), 1);
    assert_eq!(transport.cache().unwrap().stats().inserts, 1);
}

#[tokio::test]
async fn test_slow_response_times_out_as_unavailable() {
    let server = pokeapi().await;
    let transport = transport(1);

    let err = transport.get_json(&server.url("pokemon/slowpoke")).await.unwrap_err();
    assert!(matches!(err, AppError::Unavailable(_)), "got {:?}", err);
    assert_eq!(transport.cache().unwrap().size(), 0);
}

#[tokio::test]
async fn test_unreachable_host_is_unavailable() {
    // Nothing listens on port 9 of the loopback interface.
    let err = transport(2)
        .get_json("http://127.0.0.1:9/pokemon/pikachu")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unavailable(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_cry_bytes_downloaded() {
    let server = pokeapi().await;
    let transport = transport(5);

    let bytes = transport.get_bytes(&server.url("cries/25.ogg")).await.unwrap();
    assert_eq!(bytes, b"OggS");

    let err = transport.get_bytes(&server.url("cries/0.ogg")).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_client_reports_unknown_creature() {
    let server = pokeapi().await;
    let client = PokeApiClient::new(Arc::new(transport(5)), server.base());

    let key = QueryKey::parse("MissingNo").unwrap();
    let err = client.pokemon(&key).await.unwrap_err();

    assert!(err.is_not_found(), "got {:?}", err);
    assert_eq!(server.targets(), vec!["/pokemon/missingno"]);
}
