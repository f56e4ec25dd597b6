//! Normalization from raw catalog listings to [`trendradar_core::ScrapedItem`].
//!
//! Price parsing is delegated to [`crate::parse`]; this module focuses on
//! structural conversion and validation of retailer payload shapes.

use chrono::Utc;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use trendradar_core::{RetailerConfig, ScrapedItem, SourceTarget};

use crate::error::ScraperError;
use crate::parse::parse_price;
use crate::types::{RawListing, RawPrice};

/// Normalizes a raw listing into a [`ScrapedItem`] scoped to its source.
///
/// The source target supplies category, segment, and market zone; the
/// retailer supplies name and country. Blank optional attributes become
/// `None`; an unparsable price becomes `None` rather than an error.
///
/// # Errors
///
/// Returns [`ScraperError::Invalid`] if the listing name or the source
/// category is blank. Listings without an identifiable product are never
/// silently coerced into signals.
pub fn normalize_listing(
    raw: RawListing,
    retailer: &RetailerConfig,
    source: &SourceTarget,
) -> Result<ScrapedItem, ScraperError> {
    let name = raw.name.trim();
    if name.is_empty() {
        return Err(ScraperError::Invalid {
            retailer: retailer.name.clone(),
            reason: "listing has no name".into(),
        });
    }
    let category = source.category.trim();
    if category.is_empty() {
        return Err(ScraperError::Invalid {
            retailer: retailer.name.clone(),
            reason: format!("source {} has a blank category", source.url),
        });
    }

    let price = raw.price.and_then(|p| match p {
        RawPrice::Number(n) => Decimal::from_f64(n).map(|d| d.round_dp(2)),
        RawPrice::Text(s) => parse_price(&s),
    });

    // Listings without their own URL fall back to the catalog page.
    let url = raw
        .url
        .map(|u| u.trim().to_owned())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| source.url.clone());

    Ok(ScrapedItem {
        retailer: retailer.name.clone(),
        url,
        name: name.to_owned(),
        brand: raw.brand.map(|b| b.trim().to_owned()).unwrap_or_default(),
        category: category.to_owned(),
        cut: non_blank(raw.attributes.cut),
        material: non_blank(raw.attributes.material),
        color: non_blank(raw.attributes.color),
        style: non_blank(raw.attributes.style),
        price,
        image_url: non_blank(raw.image),
        segment: source.segment.trim().to_owned(),
        market_zone: source.market_zone.clone(),
        country: retailer.country.clone(),
        scraped_at: Utc::now(),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
