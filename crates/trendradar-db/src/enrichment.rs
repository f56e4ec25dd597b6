//! Database operations for `generated_product_images`, the AI enrichment
//! cache.
//!
//! The cache is read-heavy and write-rare; upsert-by-unique-fingerprint is
//! what serializes concurrent writers for the same key, no explicit locking.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `generated_product_images` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct GeneratedImageRow {
    pub id: i64,
    pub trend_key: String,
    pub prompt_text: String,
    pub image_url: Option<String>,
    pub advice_text: Option<String>,
    pub rating: Option<i16>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A confirmed trend eligible for enrichment, joined with enough context to
/// build the LLM prompt.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EnrichmentCandidate {
    pub trend_key: String,
    pub name: String,
    pub category: String,
    pub cut: String,
    pub material: String,
    pub color: Option<String>,
    pub style: Option<String>,
    pub segment: String,
    pub average_price: Option<Decimal>,
    pub trend_score: i16,
    pub saturability: i16,
}

/// Fetch the cached enrichment for one fingerprint, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_cached_enrichment(
    pool: &PgPool,
    trend_key: &str,
) -> Result<Option<GeneratedImageRow>, DbError> {
    let row = sqlx::query_as::<_, GeneratedImageRow>(
        "SELECT id, trend_key, prompt_text, image_url, advice_text, rating, \
                created_at, updated_at \
         FROM generated_product_images WHERE trend_key = $1",
    )
    .bind(trend_key)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Upsert the enrichment cache entry for a fingerprint.
///
/// The row is created once per fingerprint and updated in place on conflict —
/// never duplicated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_generated_image(
    pool: &PgPool,
    trend_key: &str,
    prompt_text: &str,
    image_url: Option<&str>,
    advice_text: Option<&str>,
    rating: Option<i16>,
) -> Result<GeneratedImageRow, DbError> {
    let row = sqlx::query_as::<_, GeneratedImageRow>(
        "INSERT INTO generated_product_images \
             (trend_key, prompt_text, image_url, advice_text, rating) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (trend_key) DO UPDATE SET \
             prompt_text = EXCLUDED.prompt_text, \
             image_url   = COALESCE(EXCLUDED.image_url, generated_product_images.image_url), \
             advice_text = COALESCE(EXCLUDED.advice_text, generated_product_images.advice_text), \
             rating      = COALESCE(EXCLUDED.rating, generated_product_images.rating), \
             updated_at  = NOW() \
         RETURNING id, trend_key, prompt_text, image_url, advice_text, rating, \
                   created_at, updated_at",
    )
    .bind(trend_key)
    .bind(prompt_text)
    .bind(image_url)
    .bind(advice_text)
    .bind(rating)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Select the next trends to enrich: confirmed products whose fingerprint has
/// no cached advice yet, least saturated first so provider budget goes to the
/// freshest trends.
///
/// One row per distinct fingerprint — several product rows may share an
/// archetype but only one provider round trip should be spent on it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_enrichment_candidates(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<EnrichmentCandidate>, DbError> {
    let rows = sqlx::query_as::<_, EnrichmentCandidate>(
        "SELECT c.trend_key, c.name, c.category, c.cut, c.material, c.color, c.style, \
                c.segment, c.average_price, c.trend_score, c.saturability \
         FROM ( \
             SELECT DISTINCT ON (p.trend_key) \
                    p.trend_key, p.name, p.category, p.cut, p.material, p.color, p.style, \
                    p.segment, p.average_price, p.trend_score, p.saturability \
             FROM trend_products p \
             LEFT JOIN generated_product_images g ON g.trend_key = p.trend_key \
             WHERE g.advice_text IS NULL \
             ORDER BY p.trend_key, p.saturability ASC, p.trend_score DESC \
         ) c \
         ORDER BY c.saturability ASC, c.trend_score DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
