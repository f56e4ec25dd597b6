//! Full-replace refresh of one retailer family: scrape, fold, confirm,
//! persist, roll up.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;

use trendradar_core::{recompute_indicators, trend_key, RetailerFamily, ScrapedItem, SignalAccumulator, TrendSignal};
use trendradar_db::{NewTrendProduct, NewTrendSignal};
use trendradar_scraper::CatalogClient;

use crate::error::EngineError;
use crate::market::rollup_current_week;

/// What one family refresh did, for logs and trigger responses.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    pub family: String,
    pub sources_count: usize,
    pub total_items: usize,
    pub deleted_signals: u64,
    pub saved_signals: u64,
    pub saved_products: u64,
    /// Source failures and rejected items. Non-fatal by construction: the
    /// refresh completes with whatever the healthy sources yielded.
    pub errors: Vec<String>,
}

/// Refreshes one retailer family end to end.
///
/// Scatter-gathers every configured source (tolerating per-source failure),
/// folds items into confirmed signals in memory, then replaces the family's
/// signals and products in one transaction. Readers only ever see the old
/// cycle or the new one, in both tables at once. Finishes by rolling the
/// confirmed products into the weekly market index.
///
/// Re-entrant: running twice on identical catalog payloads converges — the
/// second run deletes exactly what the first saved.
///
/// # Errors
///
/// Returns [`EngineError::Db`] if persistence fails. Scrape and validation
/// failures are reported in [`RefreshOutcome::errors`] instead.
pub async fn run_family_refresh(
    pool: &PgPool,
    client: &CatalogClient,
    family: &RetailerFamily,
    per_source_timeout: Duration,
) -> Result<RefreshOutcome, EngineError> {
    let report = trendradar_scraper::collect_family_items(client, family, per_source_timeout).await;

    let mut errors: Vec<String> = report.errors.iter().map(|e| e.error.clone()).collect();
    let total_items = report.items.len();

    let mut accumulator = SignalAccumulator::new();
    for item in &report.items {
        if let Err(err) = accumulator.ingest(item) {
            errors.push(err.to_string());
        }
    }
    let signals = accumulator.into_signals();

    let new_signals: Vec<NewTrendSignal> = signals.iter().map(NewTrendSignal::from).collect();
    let products = project_products(&signals, &report.items);
    let counts =
        trendradar_db::replace_family_cycle(pool, &family.name, &new_signals, &products).await?;

    rollup_current_week(pool, &products).await?;

    let outcome = RefreshOutcome {
        family: family.name.clone(),
        sources_count: report.sources_count,
        total_items,
        deleted_signals: counts.deleted_signals,
        saved_signals: counts.saved_signals,
        saved_products: counts.saved_products,
        errors,
    };
    tracing::info!(
        family = %outcome.family,
        sources = outcome.sources_count,
        items = outcome.total_items,
        signals = outcome.saved_signals,
        products = outcome.saved_products,
        errors = outcome.errors.len(),
        "family refresh complete"
    );
    Ok(outcome)
}

/// Projects confirmed signals onto product rows: one row per distinct listing
/// URL whose fingerprint reached quorum, indicators freshly computed.
fn project_products(signals: &[TrendSignal], items: &[ScrapedItem]) -> Vec<NewTrendProduct> {
    let now = Utc::now();
    let confirmed: HashMap<String, &TrendSignal> = signals
        .iter()
        .filter(|s| s.is_confirmed)
        .map(|s| (s.trend_key(), s))
        .collect();

    let mut seen_urls: HashSet<&str> = HashSet::new();
    let mut products = Vec::new();
    for item in items {
        let key = trend_key(&item.category, item.cut.as_deref(), item.material.as_deref());
        let Some(signal) = confirmed.get(&key) else {
            continue;
        };
        if !seen_urls.insert(item.url.as_str()) {
            continue;
        }

        // A fresh cycle carries no growth measurement yet; indicators start
        // from the neutral baseline and age from the signal's first sighting.
        let indicators = recompute_indicators(None, None, signal.first_seen_at, now);

        products.push(NewTrendProduct {
            trend_key: key,
            name: item.name.clone(),
            category: signal.product_type.clone(),
            style: item.style.clone(),
            cut: signal.cut.clone(),
            material: signal.material.clone(),
            color: item.color.clone(),
            product_brand: (!item.brand.trim().is_empty()).then(|| item.brand.trim().to_owned()),
            trend_score: indicators.trend_score,
            trend_score_visual: indicators.trend_score_visual,
            saturability: indicators.saturability,
            trend_growth_percent: None,
            trend_label: None,
            average_price: signal.average_price,
            image_url: item.image_url.clone(),
            source_url: item.url.clone(),
            market_zone: item.market_zone.clone(),
            segment: item.segment.clone(),
            country: item.country.clone(),
        });
    }
    products
}
