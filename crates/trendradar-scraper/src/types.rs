//! Raw deserialization types for retailer catalog JSON endpoints.
//!
//! Retailer catalogs differ in trivia (price as a number vs a localized
//! string, `image` vs `image_url`) but share the same overall shape; these
//! types absorb that variance so [`crate::normalize`] only sees one form.

use serde::Deserialize;

/// Top-level catalog payload: a flat list of listings.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub items: Vec<RawListing>,
}

/// One product listing as a retailer publishes it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawListing {
    #[serde(default)]
    pub name: String,
    pub brand: Option<String>,
    pub price: Option<RawPrice>,
    pub url: Option<String>,
    #[serde(alias = "image_url")]
    pub image: Option<String>,
    #[serde(default)]
    pub attributes: RawAttributes,
}

/// Garment attributes; retailers omit whole sections freely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAttributes {
    pub cut: Option<String>,
    pub material: Option<String>,
    pub color: Option<String>,
    pub style: Option<String>,
}

/// Price as published: either a bare number or a localized string
/// ("29,99 €", "$1,299.00").
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    Number(f64),
    Text(String),
}
