//! Integration tests for `RateLimitedFetcher`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made. Policies use millisecond timings to keep the
//! suite fast; the production numbers are covered by the pacing unit tests.

use std::time::{Duration, Instant};

use jobwatch_core::FetchPolicy;
use jobwatch_scraper::{ExpiryDetector, FetchError, ListingState, RateLimitedFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn policy(
    min_interval_ms: u64,
    timeout_ms: u64,
    max_attempts: u32,
    retry_delay_ms: u64,
) -> FetchPolicy {
    FetchPolicy {
        min_interval: Duration::from_millis(min_interval_ms),
        request_timeout: Duration::from_millis(timeout_ms),
        max_attempts,
        retry_delay: Duration::from_millis(retry_delay_ms),
    }
}

fn test_fetcher(policy: &FetchPolicy) -> RateLimitedFetcher {
    RateLimitedFetcher::new(policy, "jobwatch-test/0.1").expect("failed to build test fetcher")
}

// ---------------------------------------------------------------------------
// Successful responses
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_returns_body_and_status_for_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/101"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>Rust Dev</body></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut fetcher = test_fetcher(&policy(0, 2_000, 4, 10));
    let url = format!("{}/job/101", server.uri());
    let page = fetcher.fetch(&url).await.expect("fetch should succeed");

    assert_eq!(page.status, 200);
    assert!(page.is_ok());
    assert_eq!(page.url, url);
    assert!(page.body.contains("Rust Dev"));
}

#[tokio::test]
async fn non_200_is_returned_as_page_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .expect(1)
        .mount(&server)
        .await;

    let mut fetcher = test_fetcher(&policy(0, 2_000, 4, 10));
    let page = fetcher
        .fetch(&format!("{}/job/404", server.uri()))
        .await
        .expect("a 404 is a page, not a failure");

    assert_eq!(page.status, 404);
    assert!(!page.is_ok());
    assert_eq!(
        ExpiryDetector::new().assess(&page),
        ListingState::Indeterminate
    );
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let mut fetcher = test_fetcher(&policy(0, 2_000, 4, 10));
    let page = fetcher
        .fetch(&format!("{}/job/1", server.uri()))
        .await
        .expect("a 503 is a page, not a failure");
    assert_eq!(page.status, 503);
}

// ---------------------------------------------------------------------------
// Retry on network failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn timeouts_are_retried_until_attempts_run_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/102"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(1_000)))
        .expect(3)
        .mount(&server)
        .await;

    let mut fetcher = test_fetcher(&policy(0, 100, 3, 20));
    let result = fetcher.fetch(&format!("{}/job/102", server.uri())).await;

    match result {
        Err(FetchError::RetriesExhausted {
            attempts, source, ..
        }) => {
            assert_eq!(attempts, 3);
            assert!(source.is_timeout(), "expected a timeout, got: {source}");
        }
        other => panic!("expected RetriesExhausted, got: {other:?}"),
    }
}

#[tokio::test]
async fn recovers_when_a_later_attempt_succeeds() {
    let server = MockServer::start().await;
    // First request hangs past the timeout; wiremock then falls through to the
    // second mock.
    Mock::given(method("GET"))
        .and(path("/job/103"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(1_000)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job/103"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Still hiring"))
        .mount(&server)
        .await;

    let mut fetcher = test_fetcher(&policy(0, 100, 4, 20));
    let page = fetcher
        .fetch(&format!("{}/job/103", server.uri()))
        .await
        .expect("second attempt should succeed");
    assert_eq!(page.body, "Still hiring");
}

#[tokio::test]
async fn connection_refused_exhausts_retries() {
    // Port 1 on localhost is essentially never listening.
    let mut fetcher = test_fetcher(&policy(0, 500, 2, 10));
    let err = fetcher
        .fetch("http://127.0.0.1:1/job/1")
        .await
        .expect_err("nothing is listening");

    match err {
        FetchError::RetriesExhausted { url, attempts, .. } => {
            assert_eq!(attempts, 2);
            assert_eq!(url, "http://127.0.0.1:1/job/1");
        }
        other @ FetchError::Http(_) => panic!("expected RetriesExhausted, got: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Pacing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn consecutive_fetches_respect_min_interval() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(2)
        .mount(&server)
        .await;

    let interval = Duration::from_millis(300);
    let mut fetcher = test_fetcher(&policy(300, 2_000, 1, 0));

    let started = Instant::now();
    fetcher
        .fetch(&format!("{}/job/1", server.uri()))
        .await
        .expect("first fetch");
    fetcher
        .fetch(&format!("{}/job/2", server.uri()))
        .await
        .expect("second fetch");

    assert!(
        started.elapsed() >= interval,
        "second request went out too early: {:?}",
        started.elapsed()
    );
}
