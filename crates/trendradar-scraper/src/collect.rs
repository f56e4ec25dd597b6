//! Scatter-gather collection across all sources of a retailer family.

use std::time::Duration;

use serde::Serialize;
use trendradar_core::{RetailerConfig, RetailerFamily, ScrapedItem, SourceTarget};

use crate::client::CatalogClient;
use crate::error::ScraperError;
use crate::normalize::normalize_listing;

/// A source-level failure recorded during collection. Failures never abort
/// the run; they are reported next to whatever the other sources yielded.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub retailer: String,
    pub url: String,
    pub error: String,
}

/// Everything one family-wide collection pass produced.
#[derive(Debug, Default)]
pub struct CollectionReport {
    pub items: Vec<ScrapedItem>,
    pub errors: Vec<SourceFailure>,
    pub sources_count: usize,
}

/// Collects items from every source of a family concurrently.
///
/// One task per source, each bounded by `per_source_timeout` independently.
/// A failing or slow source contributes zero items plus a [`SourceFailure`]
/// entry; sibling tasks are never cancelled. Listings that fail validation
/// are likewise recorded and skipped without poisoning the rest of their
/// source's payload.
pub async fn collect_family_items(
    client: &CatalogClient,
    family: &RetailerFamily,
    per_source_timeout: Duration,
) -> CollectionReport {
    let targets = family.targets();
    let mut report = CollectionReport {
        sources_count: targets.len(),
        ..CollectionReport::default()
    };

    let mut handles = Vec::with_capacity(targets.len());
    for (retailer, source) in targets {
        let client = client.clone();
        let retailer = retailer.clone();
        let source = source.clone();
        handles.push(tokio::spawn(async move {
            let outcome = tokio::time::timeout(
                per_source_timeout,
                fetch_source(&client, &retailer, &source),
            )
            .await
            .unwrap_or_else(|_| {
                Err(ScraperError::SourceTimeout {
                    url: source.url.clone(),
                    timeout_secs: per_source_timeout.as_secs(),
                })
            });
            (retailer, source, outcome)
        }));
    }

    for handle in handles {
        // A panicked task is reported like any other source failure.
        match handle.await {
            Ok((retailer, source, Ok((items, invalid)))) => {
                tracing::debug!(
                    retailer = %retailer.name,
                    url = %source.url,
                    items = items.len(),
                    invalid = invalid.len(),
                    "source collected"
                );
                report.items.extend(items);
                report.errors.extend(invalid);
            }
            Ok((retailer, source, Err(err))) => {
                tracing::warn!(
                    retailer = %retailer.name,
                    url = %source.url,
                    error = %err,
                    "source failed, continuing with remaining sources"
                );
                report.errors.push(SourceFailure {
                    retailer: retailer.name,
                    url: source.url,
                    error: err.to_string(),
                });
            }
            Err(join_err) => {
                report.errors.push(SourceFailure {
                    retailer: String::new(),
                    url: String::new(),
                    error: format!("collection task panicked: {join_err}"),
                });
            }
        }
    }

    report
}

/// Fetches one source and normalizes its listings. Invalid listings are
/// returned separately so the caller can report them without losing the
/// valid remainder.
async fn fetch_source(
    client: &CatalogClient,
    retailer: &RetailerConfig,
    source: &SourceTarget,
) -> Result<(Vec<ScrapedItem>, Vec<SourceFailure>), ScraperError> {
    let catalog = client.fetch_catalog(&source.url).await?;

    let mut items = Vec::with_capacity(catalog.items.len());
    let mut invalid = Vec::new();
    for raw in catalog.items {
        match normalize_listing(raw, retailer, source) {
            Ok(item) => items.push(item),
            Err(err) => invalid.push(SourceFailure {
                retailer: retailer.name.clone(),
                url: source.url.clone(),
                error: err.to_string(),
            }),
        }
    }
    Ok((items, invalid))
}
