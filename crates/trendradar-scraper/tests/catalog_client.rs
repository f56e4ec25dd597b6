//! Integration tests for `CatalogClient` and `collect_family_items`.
//!
//! Uses `wiremock` to stand up a local HTTP server per test so no real
//! network traffic is made. Covers the happy path, every error variant
//! `fetch_catalog` can produce, and partial-failure collection semantics.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trendradar_core::{RetailerConfig, RetailerFamily, SourceTarget};
use trendradar_scraper::{collect_family_items, CatalogClient, ScraperError};

/// Builds a `CatalogClient` suitable for tests: 5-second timeout, no retries.
fn test_client() -> CatalogClient {
    CatalogClient::new(5, "trendradar-test/0.1", 0, 0).expect("failed to build test client")
}

fn test_client_with_retries(max_retries: u32) -> CatalogClient {
    CatalogClient::new(5, "trendradar-test/0.1", max_retries, 0)
        .expect("failed to build test client")
}

/// Minimal valid one-listing catalog fixture.
fn one_listing_json(name: &str) -> serde_json::Value {
    json!({
        "items": [{
            "name": name,
            "brand": "Nike",
            "price": "29,99 €",
            "url": "https://shop.example.com/p/1",
            "image": null,
            "attributes": {"cut": "oversize", "material": "cotton"}
        }]
    })
}

fn family_with_sources(server_uri: &str, paths: &[&str]) -> RetailerFamily {
    RetailerFamily {
        name: "all-trends".to_owned(),
        schedule: Some("nightly".to_owned()),
        retailers: vec![RetailerConfig {
            name: "Zalando".to_owned(),
            country: Some("DE".to_owned()),
            priority: 1,
            sources: paths
                .iter()
                .map(|p| SourceTarget {
                    url: format!("{server_uri}{p}"),
                    category: "hoodie".to_owned(),
                    segment: "womenswear".to_owned(),
                    market_zone: Some("EU".to_owned()),
                })
                .collect(),
        }],
    }
}

// ---------------------------------------------------------------------------
// fetch_catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_catalog_parses_listings() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hoodies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&one_listing_json("Oversize Hoodie")))
        .mount(&server)
        .await;

    let catalog = test_client()
        .fetch_catalog(&format!("{}/hoodies", server.uri()))
        .await
        .expect("fetch succeeds");
    assert_eq!(catalog.items.len(), 1);
    assert_eq!(catalog.items[0].name, "Oversize Hoodie");
}

#[tokio::test]
async fn fetch_catalog_maps_404_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_catalog(&format!("{}/gone", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::NotFound { .. }));
}

#[tokio::test]
async fn fetch_catalog_maps_429_with_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "17"))
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_catalog(&format!("{}/busy", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScraperError::RateLimited {
            retry_after_secs: 17,
            ..
        }
    ));
}

#[tokio::test]
async fn fetch_catalog_maps_other_statuses() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/blocked"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_catalog(&format!("{}/blocked", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScraperError::UnexpectedStatus { status: 403, .. }
    ));
}

#[tokio::test]
async fn fetch_catalog_rejects_malformed_json() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_catalog(&format!("{}/broken", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::Deserialize { .. }));
}

#[tokio::test]
async fn fetch_catalog_retries_5xx_then_succeeds() {
    let server = MockServer::start().await;

    // First attempt gets a 503, the retry gets the real payload.
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&one_listing_json("Hoodie")))
        .mount(&server)
        .await;

    let catalog = test_client_with_retries(2)
        .fetch_catalog(&format!("{}/flaky", server.uri()))
        .await
        .expect("retry succeeds");
    assert_eq!(catalog.items.len(), 1);
}

// ---------------------------------------------------------------------------
// collect_family_items — scatter-gather
// ---------------------------------------------------------------------------

#[tokio::test]
async fn collect_gathers_all_sources() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hoodies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&one_listing_json("Hoodie")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jeans"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&one_listing_json("Jeans")))
        .mount(&server)
        .await;

    let family = family_with_sources(&server.uri(), &["/hoodies", "/jeans"]);
    let report =
        collect_family_items(&test_client(), &family, Duration::from_secs(5)).await;

    assert_eq!(report.sources_count, 2);
    assert_eq!(report.items.len(), 2);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn collect_tolerates_a_failing_source() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hoodies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&one_listing_json("Hoodie")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jeans"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let family = family_with_sources(&server.uri(), &["/hoodies", "/jeans"]);
    let report =
        collect_family_items(&test_client(), &family, Duration::from_secs(5)).await;

    assert_eq!(report.items.len(), 1, "healthy source still contributes");
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].error.contains("not found"));
}

#[tokio::test]
async fn collect_times_out_a_slow_source_without_cancelling_siblings() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hoodies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&one_listing_json("Hoodie")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&one_listing_json("Too Late"))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let family = family_with_sources(&server.uri(), &["/hoodies", "/slow"]);
    let report =
        collect_family_items(&test_client(), &family, Duration::from_millis(500)).await;

    assert_eq!(report.items.len(), 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].error.contains("timed out"));
}

#[tokio::test]
async fn collect_skips_invalid_listings_but_keeps_the_rest() {
    let server = MockServer::start().await;

    let body = json!({
        "items": [
            {"name": "Oversize Hoodie", "brand": "Nike"},
            {"name": "   ", "brand": "Adidas"}
        ]
    });
    Mock::given(method("GET"))
        .and(path("/hoodies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let family = family_with_sources(&server.uri(), &["/hoodies"]);
    let report =
        collect_family_items(&test_client(), &family, Duration::from_secs(5)).await;

    assert_eq!(report.items.len(), 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].error.contains("no name"));
}
