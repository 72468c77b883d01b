//! Behavior-driven tests for the data resolver
//!
//! These tests verify WHICH tier serves the security list as the cache ages,
//! the remote document changes and the durable snapshot comes and goes.

use bist_core::{
    storage::SNAPSHOT_KEY, DocumentLocation, HttpResponse, JsonDocumentSource, KeyValueStore,
    ManualClock, MemoryStore, ResolvedFrom, ScriptedHttpClient, Security, StockService,
    StoredSnapshot, Symbol, UtcDateTime,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const DATA_URL: &str = "https://dashboard.test/data.json";

fn t0() -> UtcDateTime {
    UtcDateTime::parse("2024-05-10T07:00:00Z").expect("timestamp")
}

fn security(symbol: &str, price: f64, book_value: f64) -> Security {
    Security::new(
        Symbol::parse(symbol).expect("symbol"),
        symbol,
        "Bankacılık",
        price,
        book_value,
        t0(),
    )
    .expect("valid security")
}

fn document(stocks: &[Security]) -> HttpResponse {
    HttpResponse::ok_json(json!({ "stocks": stocks }).to_string())
}

fn service(
    http: &Arc<ScriptedHttpClient>,
    store: &Arc<MemoryStore>,
    clock: &ManualClock,
) -> StockService {
    let source = JsonDocumentSource::with_http_client(
        DocumentLocation::parse(DATA_URL),
        Arc::clone(http) as _,
    );
    StockService::new(Arc::new(source), Arc::clone(store) as _).with_clock(Arc::new(clock.clone()))
}

// =============================================================================
// Resolver: Remote and Cache Tiers
// =============================================================================

#[tokio::test]
async fn when_remote_document_is_served_resolver_caches_and_persists_it() {
    // Given: A healthy remote document with two securities
    let stocks = vec![security("AKBNK", 50.0, 60.0), security("THYAO", 280.0, 140.0)];
    let http = Arc::new(ScriptedHttpClient::always(Ok(document(&stocks))));
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(t0());
    let service = service(&http, &store, &clock);

    // When: The list is resolved
    let resolution = service.resolve().await.expect("remote document resolves");

    // Then: The remote tier served it and a snapshot was written with the fetch time
    assert_eq!(resolution.from, ResolvedFrom::Remote);
    assert_eq!(resolution.stocks, stocks);
    assert!(resolution.warnings.is_empty());

    let snapshot = StoredSnapshot::load(store.as_ref())
        .expect("snapshot readable")
        .expect("snapshot written");
    assert_eq!(snapshot.stocks, stocks);
    assert_eq!(snapshot.fetched_at(), Some(t0()));
    assert_eq!(
        service.next_update_time().await,
        Some(t0().plus(Duration::from_secs(15 * 60)))
    );
}

#[tokio::test]
async fn when_cache_is_younger_than_window_no_request_is_made() {
    // Given: A resolver that already fetched once
    let http = Arc::new(ScriptedHttpClient::always(Ok(document(&[security(
        "AKBNK", 50.0, 60.0,
    )]))));
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(t0());
    let service = service(&http, &store, &clock);
    service.resolve().await.expect("first resolve");

    // When: The list is requested again 14 minutes later
    clock.advance(Duration::from_secs(14 * 60));
    let second = service.resolve().await.expect("second resolve");

    // Then: The cache served it and the remote was hit only once
    assert_eq!(second.from, ResolvedFrom::Cache);
    assert_eq!(http.calls(), 1);
    assert!(service.is_cache_valid().await);
}

#[tokio::test]
async fn when_cache_window_elapses_resolver_fetches_again() {
    // Given: A resolver that fetched at t0
    let http = Arc::new(ScriptedHttpClient::sequence(
        vec![Ok(document(&[security("AKBNK", 50.0, 60.0)]))],
        Ok(document(&[security("AKBNK", 55.0, 60.0)])),
    ));
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(t0());
    let service = service(&http, &store, &clock);
    service.resolve().await.expect("first resolve");

    // When: Exactly one window later the list is requested
    clock.advance(Duration::from_secs(15 * 60));
    let refreshed = service.resolve().await.expect("refetch");

    // Then: The new document is served and the window restarts
    assert_eq!(refreshed.from, ResolvedFrom::Remote);
    assert_eq!(refreshed.stocks[0].current_price, 55.0);
    assert_eq!(http.calls(), 2);
    assert_eq!(
        service.status().await.last_fetch,
        Some(t0().plus(Duration::from_secs(15 * 60)))
    );
}

#[tokio::test]
async fn when_refresh_is_forced_valid_cache_is_bypassed() {
    // Given: A freshly populated cache
    let http = Arc::new(ScriptedHttpClient::always(Ok(document(&[security(
        "AKBNK", 50.0, 60.0,
    )]))));
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(t0());
    let service = service(&http, &store, &clock);
    service.resolve().await.expect("first resolve");

    // When: A manual refresh happens one minute later
    clock.advance(Duration::from_secs(60));
    let forced = service.force_refresh().await.expect("forced refresh");

    // Then: The remote was asked again
    assert_eq!(forced.from, ResolvedFrom::Remote);
    assert_eq!(http.calls(), 2);
}

#[tokio::test]
async fn when_callers_race_only_one_remote_request_is_made() {
    // Given: A shared resolver with an empty cache
    let http = Arc::new(ScriptedHttpClient::always(Ok(document(&[security(
        "AKBNK", 50.0, 60.0,
    )]))));
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(t0());
    let service = Arc::new(service(&http, &store, &clock));

    // When: Two consumers resolve at the same time
    let (left, right) = tokio::join!(service.resolve(), service.resolve());

    // Then: One went to the remote, the other was served from cache
    let mut tiers = vec![left.expect("left").from, right.expect("right").from];
    tiers.sort_by_key(|from| from.as_str());
    assert_eq!(tiers, vec![ResolvedFrom::Cache, ResolvedFrom::Remote]);
    assert_eq!(http.calls(), 1);
}

// =============================================================================
// Resolver: Snapshot Tier
// =============================================================================

#[tokio::test]
async fn when_remote_fails_snapshot_is_served_and_remote_retried_next_time() {
    // Given: A stored snapshot from yesterday and a failing remote
    let yesterday = t0().minus(Duration::from_secs(24 * 60 * 60));
    let stored = vec![security("GARAN", 100.0, 120.0)];
    let store = Arc::new(MemoryStore::new());
    StoredSnapshot::new(stored.clone(), yesterday)
        .save(store.as_ref())
        .expect("seed snapshot");

    let http = Arc::new(ScriptedHttpClient::sequence(
        vec![Ok(HttpResponse::with_status(503, "maintenance"))],
        Ok(document(&[security("GARAN", 101.0, 120.0)])),
    ));
    let clock = ManualClock::new(t0());
    let service = service(&http, &store, &clock);

    // When: The list is resolved twice
    let first = service.resolve().await.expect("snapshot resolves");
    let second = service.resolve().await.expect("remote recovered");

    // Then: The snapshot answered first without restarting the cache window
    assert_eq!(first.from, ResolvedFrom::Snapshot);
    assert_eq!(first.stocks, stored);
    assert_eq!(first.warnings.len(), 1);

    // And: The next call went back to the remote
    assert_eq!(second.from, ResolvedFrom::Remote);
    assert_eq!(http.calls(), 2);
}

#[tokio::test]
async fn when_snapshot_is_served_its_timestamp_is_left_untouched() {
    // Given: A snapshot written an hour ago and a remote that is down
    let an_hour_ago = t0().minus(Duration::from_secs(60 * 60));
    let store = Arc::new(MemoryStore::new());
    StoredSnapshot::new(vec![security("ASELS", 60.0, 20.0)], an_hour_ago)
        .save(store.as_ref())
        .expect("seed snapshot");
    let http = Arc::new(ScriptedHttpClient::always(Ok(HttpResponse::with_status(
        500, "",
    ))));
    let clock = ManualClock::new(t0());
    let service = service(&http, &store, &clock);

    // When: The snapshot is served
    let resolution = service.resolve().await.expect("snapshot resolves");

    // Then: The stored record still carries the original fetch time
    assert_eq!(resolution.from, ResolvedFrom::Snapshot);
    let raw = store
        .get(SNAPSHOT_KEY)
        .expect("readable")
        .expect("still present");
    let reloaded: StoredSnapshot = serde_json::from_str(&raw).expect("snapshot json");
    assert_eq!(reloaded.fetched_at(), Some(an_hour_ago));
    assert!(!service.is_cache_valid().await);
    assert_eq!(service.next_update_time().await, None);
}
