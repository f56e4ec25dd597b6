//! Ingestion, grouping, and brand-quorum confirmation.
//!
//! Scraped items are transient: they are folded into [`TrendSignal`]
//! aggregates keyed by the canonical `product_type|cut|material` fingerprint
//! and discarded. Confirmation is monotonic within a refresh cycle — a signal
//! that reaches quorum stays confirmed until the whole family is replaced.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Minimum number of distinct brands required to confirm a trend.
pub const BRAND_QUORUM: usize = 3;

/// A normalized catalog listing from one retailer. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapedItem {
    pub retailer: String,
    pub url: String,
    pub name: String,
    pub brand: String,
    /// Product type, e.g. "hoodie". Required.
    pub category: String,
    pub cut: Option<String>,
    pub material: Option<String>,
    pub color: Option<String>,
    pub style: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub segment: String,
    pub market_zone: Option<String>,
    pub country: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

/// An aggregated cross-retailer observation of a product archetype.
#[derive(Debug, Clone, Serialize)]
pub struct TrendSignal {
    pub product_type: String,
    /// Empty string when the cut is unknown — never `None`, so the grouping
    /// key stays stable.
    pub cut: String,
    pub material: String,
    pub color: Option<String>,
    pub style: Option<String>,
    pub country: Option<String>,
    pub segment: String,
    pub market_zone: Option<String>,
    pub brands: BTreeSet<String>,
    pub average_price: Option<Decimal>,
    pub observation_count: u32,
    pub confirmation_score: u32,
    pub is_confirmed: bool,
    pub first_seen_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    /// Representative listing URL (first item folded into the signal).
    pub source_url: String,
}

impl TrendSignal {
    /// Canonical fingerprint of this signal's archetype.
    #[must_use]
    pub fn trend_key(&self) -> String {
        trend_key(
            &self.product_type,
            Some(self.cut.as_str()),
            Some(self.material.as_str()),
        )
    }
}

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("scraped item from {retailer} has a blank product type")]
    MissingProductType { retailer: String },
}

fn key_part(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_lowercase()
}

/// Canonical grouping fingerprint: `product_type|cut|material`, lowercase and
/// trimmed, with missing parts folded to the empty-string sentinel.
#[must_use]
pub fn trend_key(product_type: &str, cut: Option<&str>, material: Option<&str>) -> String {
    format!(
        "{}|{}|{}",
        product_type.trim().to_lowercase(),
        key_part(cut),
        key_part(material)
    )
}

struct SignalAgg {
    signal: TrendSignal,
    price_sum: Decimal,
    priced_count: u32,
}

/// Folds scraped items into keyed trend signals.
///
/// Ingestion is idempotent per `(retailer, trend_key)` pair: replaying the
/// same pair neither grows the brand set nor skews the running price mean.
#[derive(Default)]
pub struct SignalAccumulator {
    signals: HashMap<String, SignalAgg>,
    seen: HashSet<(String, String)>,
}

impl SignalAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct signals accumulated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Fold one item into the matching signal, creating it on first sight.
    ///
    /// Applies the brand-quorum rule after every fold; the confirmed flag is
    /// monotonic — once set it is never cleared by further ingestion.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::MissingProductType`] if the item's category is
    /// blank. Inconsistent data is rejected here, never silently coerced.
    pub fn ingest(&mut self, item: &ScrapedItem) -> Result<(), SignalError> {
        if item.category.trim().is_empty() {
            return Err(SignalError::MissingProductType {
                retailer: item.retailer.clone(),
            });
        }

        let key = trend_key(&item.category, item.cut.as_deref(), item.material.as_deref());
        let pair = (item.retailer.trim().to_lowercase(), key.clone());
        if !self.seen.insert(pair) {
            // Same retailer+key already folded this cycle; a replay must not
            // double-count anything.
            return Ok(());
        }

        // Retailers without an explicit brand attribute count under their own
        // storefront name for quorum purposes.
        let brand = if item.brand.trim().is_empty() {
            item.retailer.trim().to_string()
        } else {
            item.brand.trim().to_string()
        };

        let agg = self.signals.entry(key).or_insert_with(|| SignalAgg {
            signal: TrendSignal {
                product_type: item.category.trim().to_lowercase(),
                cut: key_part(item.cut.as_deref()),
                material: key_part(item.material.as_deref()),
                color: item.color.clone(),
                style: item.style.clone(),
                country: item.country.clone(),
                segment: item.segment.clone(),
                market_zone: item.market_zone.clone(),
                brands: BTreeSet::new(),
                average_price: None,
                observation_count: 0,
                confirmation_score: 0,
                is_confirmed: false,
                first_seen_at: item.scraped_at,
                confirmed_at: None,
                source_url: item.url.clone(),
            },
            price_sum: Decimal::ZERO,
            priced_count: 0,
        });

        agg.signal.brands.insert(brand);
        agg.signal.observation_count += 1;

        if let Some(price) = item.price {
            agg.price_sum += price;
            agg.priced_count += 1;
            agg.signal.average_price =
                Some((agg.price_sum / Decimal::from(agg.priced_count)).round_dp(2));
        }

        let score = u32::try_from(agg.signal.brands.len()).unwrap_or(u32::MAX);
        agg.signal.confirmation_score = agg.signal.confirmation_score.max(score);
        if !agg.signal.is_confirmed && agg.signal.brands.len() >= BRAND_QUORUM {
            agg.signal.is_confirmed = true;
            agg.signal.confirmed_at = Some(item.scraped_at);
        }

        Ok(())
    }

    /// Consume the accumulator, returning signals ordered by fingerprint for
    /// deterministic persistence.
    #[must_use]
    pub fn into_signals(self) -> Vec<TrendSignal> {
        let mut signals: Vec<TrendSignal> =
            self.signals.into_values().map(|agg| agg.signal).collect();
        signals.sort_by(|a, b| a.trend_key().cmp(&b.trend_key()));
        signals
    }
}
