//! Behavior-driven tests for failure handling
//!
//! These tests verify WHAT the user still gets when the remote source, the
//! durable snapshot or both are unusable.

use bist_core::{
    parse_feed, storage::SNAPSHOT_KEY, synthetic::SYMBOLS, DocumentLocation, EnvelopeError,
    HttpError, HttpResponse, JsonDocumentSource, KeyValueStore, ManualClock, MemoryStore,
    QueryClient, QueryError, QueryOptions, QueryState, ResolvedFrom, RetryConfig,
    ScriptedHttpClient, Security, SourceErrorKind, StockService, StoredSnapshot, Symbol,
    SyntheticGenerator, UtcDateTime,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const DATA_URL: &str = "https://dashboard.test/data.json";

fn t0() -> UtcDateTime {
    UtcDateTime::parse("2024-05-10T07:00:00Z").expect("timestamp")
}

fn service(http: &Arc<ScriptedHttpClient>, store: &Arc<MemoryStore>) -> StockService {
    let source = JsonDocumentSource::with_http_client(
        DocumentLocation::parse(DATA_URL),
        Arc::clone(http) as _,
    );
    StockService::new(Arc::new(source), Arc::clone(store) as _)
        .with_clock(Arc::new(ManualClock::new(t0())))
        .with_generator(SyntheticGenerator::with_seed(42))
}

fn failing(status: u16) -> Arc<ScriptedHttpClient> {
    Arc::new(ScriptedHttpClient::always(Ok(HttpResponse::with_status(
        status, "",
    ))))
}

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let security = Security::new(
        Symbol::parse("KCHOL").expect("symbol"),
        "Koç Holding",
        "Holding",
        180.0,
        150.0,
        t0(),
    )
    .expect("valid");
    StoredSnapshot::new(vec![security], t0().minus(Duration::from_secs(3600)))
        .save(store.as_ref())
        .expect("seed snapshot");
    store
}

// =============================================================================
// Error Handling: Remote Failures
// =============================================================================

#[tokio::test]
async fn when_remote_returns_server_error_snapshot_is_served_with_reason() {
    // Given: A remote answering 500 and a stored snapshot
    let http = failing(500);
    let store = seeded_store();
    let service = service(&http, &store);

    // When: The list is resolved
    let resolution = service.resolve().await.expect("snapshot tier answers");

    // Then: The snapshot is served and the HTTP status is reported as a warning
    assert_eq!(resolution.from, ResolvedFrom::Snapshot);
    assert_eq!(resolution.stocks.len(), 1);
    assert_eq!(resolution.warnings.len(), 1);
    assert!(resolution.warnings[0].contains("500"));
}

#[tokio::test]
async fn when_remote_and_snapshot_are_both_missing_synthetic_universe_is_served() {
    // Given: A remote timing out and nothing stored
    let http = Arc::new(ScriptedHttpClient::always(Err(HttpError::timeout(
        "request timed out after 10000ms",
    ))));
    let store = Arc::new(MemoryStore::new());
    let service = service(&http, &store);

    // When: The list is resolved
    let resolution = service.resolve().await.expect("synthetic tier answers");

    // Then: Every universe symbol is generated, cached but never persisted
    assert_eq!(resolution.from, ResolvedFrom::Synthetic);
    assert_eq!(resolution.stocks.len(), SYMBOLS.len());
    assert_eq!(resolution.stocks.len(), 509);
    assert!(service.is_cache_valid().await);
    assert_eq!(store.get(SNAPSHOT_KEY).expect("readable"), None);

    // And: The next call inside the window reuses the generated list
    let again = service.resolve().await.expect("cache answers");
    assert_eq!(again.from, ResolvedFrom::Cache);
    assert_eq!(again.stocks, resolution.stocks);
    assert_eq!(http.calls(), 1);
}

#[tokio::test]
async fn when_document_lacks_stocks_array_it_counts_as_a_failure() {
    // Given: A remote serving JSON without a stocks array
    let http = Arc::new(ScriptedHttpClient::always(Ok(HttpResponse::ok_json(
        json!({ "data": [] }).to_string(),
    ))));
    let store = seeded_store();
    let service = service(&http, &store);

    // When: The list is resolved
    let resolution = service.resolve().await.expect("snapshot tier answers");

    // Then: The malformed document falls through to the snapshot
    assert_eq!(resolution.from, ResolvedFrom::Snapshot);
    let error = parse_feed(r#"{"data":[]}"#).expect_err("schema error");
    assert_eq!(error.kind(), SourceErrorKind::Schema);
    assert!(!error.retryable());
}

#[tokio::test]
async fn when_snapshot_is_corrupt_resolver_falls_through_to_synthetic() {
    // Given: A failing remote and a snapshot entry that is not JSON
    let http = failing(502);
    let store = Arc::new(MemoryStore::new());
    store.set(SNAPSHOT_KEY, "{ not json").expect("seed garbage");
    let service = service(&http, &store);

    // When: The list is resolved
    let resolution = service.resolve().await.expect("synthetic tier answers");

    // Then: Both failures are reported and synthetic data is served
    assert_eq!(resolution.from, ResolvedFrom::Synthetic);
    assert_eq!(resolution.warnings.len(), 2);
}

// =============================================================================
// Error Handling: Synthetic Fallback Disabled
// =============================================================================

#[tokio::test]
async fn when_synthetic_fallback_is_disabled_remote_error_surfaces() {
    // Given: A resolver that must not invent data, with nothing to fall back on
    let http = failing(503);
    let store = Arc::new(MemoryStore::new());
    let service = service(&http, &store).without_synthetic_fallback();

    // When: The list is resolved
    let error = service.resolve().await.expect_err("no tier can answer");

    // Then: The primary failure is returned as retryable
    assert_eq!(error.kind(), SourceErrorKind::Status);
    assert!(error.retryable());

    // And: The envelope form keeps the code and retry hint
    let envelope_error = EnvelopeError::from(&error);
    assert_eq!(envelope_error.code, error.code());
    assert_eq!(envelope_error.retryable, Some(true));
}

#[tokio::test]
async fn when_query_retries_are_exhausted_error_state_carries_attempt_count() {
    // Given: A query with two quick retries over a resolver that always fails
    let http = failing(503);
    let store = Arc::new(MemoryStore::new());
    let service = service(&http, &store).without_synthetic_fallback();
    let client = QueryClient::new(
        Arc::new(service),
        QueryOptions {
            retry: RetryConfig::fixed(Duration::from_millis(1), 2),
            ..QueryOptions::default()
        },
    );

    // When: The dashboard mounts
    let state = client.mount().await;

    // Then: Three attempts were made and the error state is exposed
    let QueryState::Error { error } = state else {
        panic!("expected an error state");
    };
    let QueryError::Exhausted { attempts, .. } = &error;
    assert_eq!(*attempts, 3);
    assert_eq!(http.calls(), 3);
    assert_eq!(client.state().await.summary().status, "error");
}

#[tokio::test]
async fn when_forced_refresh_fails_after_success_user_still_sees_stored_data() {
    // Given: A query that loaded once and then loses the remote
    let http = Arc::new(ScriptedHttpClient::sequence(
        vec![Ok(HttpResponse::ok_json(
            json!({ "stocks": [Security::new(
                Symbol::parse("SISE").expect("symbol"),
                "Şişecam",
                "Cam",
                45.0,
                50.0,
                t0(),
            ).expect("valid")] })
            .to_string(),
        ))],
        Ok(HttpResponse::with_status(500, "")),
    ));
    let store = Arc::new(MemoryStore::new());
    let service = service(&http, &store).without_synthetic_fallback();
    let client = QueryClient::new(
        Arc::new(service),
        QueryOptions {
            retry: RetryConfig::no_retry(),
            ..QueryOptions::default()
        },
    );
    client.mount().await;

    // When: A forced refresh fails and the snapshot written by the first load answers
    let state = client.refresh().await;

    // Then: The user still sees data
    let QueryState::Success { data, from, .. } = state else {
        panic!("expected stored data to be served");
    };
    assert_eq!(from, ResolvedFrom::Snapshot);
    assert_eq!(data[0].symbol.as_str(), "SISE");
}
