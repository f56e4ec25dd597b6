//! Database operations for `trend_products`, the ranking/display projection.
//!
//! `source_url` is the upsert identity used by the refresh pipeline;
//! `trend_key` exists only to join the enrichment cache. Reads never block on
//! a refresh — replacement happens transactionally, together with the
//! family's signals when driven through [`crate::cycle`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use trendradar_core::{TrendIndicators, TrendLabel};

use crate::DbError;

/// Hard ceiling on ranked reads, regardless of what the caller asks for.
pub const MAX_TREND_LIMIT: i64 = 120;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `trend_products` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct TrendProductRow {
    pub id: i64,
    pub family: String,
    pub trend_key: String,
    pub name: String,
    pub category: String,
    pub style: Option<String>,
    pub cut: String,
    pub material: String,
    pub color: Option<String>,
    pub product_brand: Option<String>,
    pub trend_score: i16,
    pub trend_score_visual: i16,
    pub saturability: i16,
    pub trend_growth_percent: Option<f64>,
    pub trend_label: Option<String>,
    pub average_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub source_url: String,
    pub market_zone: Option<String>,
    pub segment: String,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A ranked trend row with its cached enrichment joined in. The enrichment
/// columns are null whenever the fingerprint has not been enriched yet —
/// a missing cache entry is not an error.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct RankedTrendRow {
    pub id: i64,
    pub trend_key: String,
    pub name: String,
    pub category: String,
    pub style: Option<String>,
    pub cut: String,
    pub material: String,
    pub color: Option<String>,
    pub product_brand: Option<String>,
    pub trend_score: i16,
    pub trend_score_visual: i16,
    pub saturability: i16,
    pub trend_growth_percent: Option<f64>,
    pub trend_label: Option<String>,
    pub average_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub source_url: String,
    pub market_zone: Option<String>,
    pub segment: String,
    pub country: Option<String>,
    pub advice_text: Option<String>,
    pub generated_image_url: Option<String>,
    pub advice_rating: Option<i16>,
}

/// Insert payload for one product row, produced by the refresh pipeline.
#[derive(Debug, Clone)]
pub struct NewTrendProduct {
    pub trend_key: String,
    pub name: String,
    pub category: String,
    pub style: Option<String>,
    pub cut: String,
    pub material: String,
    pub color: Option<String>,
    pub product_brand: Option<String>,
    pub trend_score: i16,
    pub trend_score_visual: i16,
    pub saturability: i16,
    pub trend_growth_percent: Option<f64>,
    pub trend_label: Option<String>,
    pub average_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub source_url: String,
    pub market_zone: Option<String>,
    pub segment: String,
    pub country: Option<String>,
}

// ---------------------------------------------------------------------------
// Filters and sorting
// ---------------------------------------------------------------------------

/// Optional-field filter for ranked reads, validated at the API boundary.
/// Blank strings are normalized to "no filter" rather than matching nothing.
#[derive(Debug, Clone, Default)]
pub struct TrendFilter {
    pub country: Option<String>,
    pub style: Option<String>,
    pub product_type: Option<String>,
    pub segment: Option<String>,
}

impl TrendFilter {
    /// Trim all fields and drop the ones left empty.
    #[must_use]
    pub fn normalized(self) -> Self {
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        Self {
            country: clean(self.country),
            style: clean(self.style),
            product_type: clean(self.product_type),
            segment: clean(self.segment),
        }
    }
}

/// Sort order for ranked reads. The default surfaces the least exploited
/// trends first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendSort {
    #[default]
    Saturability,
    TrendScore,
    Price,
}

impl TrendSort {
    fn order_clause(self) -> &'static str {
        match self {
            TrendSort::Saturability => "p.saturability ASC, p.trend_score DESC, p.id ASC",
            TrendSort::TrendScore => "p.trend_score DESC, p.saturability ASC, p.id ASC",
            TrendSort::Price => "p.average_price ASC NULLS LAST, p.id ASC",
        }
    }
}

impl std::str::FromStr for TrendSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "saturability" => Ok(TrendSort::Saturability),
            "trend_score" | "score" => Ok(TrendSort::TrendScore),
            "price" => Ok(TrendSort::Price),
            other => Err(format!("unknown sort: '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Write path
// ---------------------------------------------------------------------------

/// Replace all product rows of one family in a single transaction.
///
/// Rows are upserted by `source_url` so that a listing shared between
/// overlapping families (e.g. "all-trends" and a per-retailer family) moves
/// to the refreshing family instead of violating the unique constraint.
/// Returns `(deleted_count, saved_count)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction rolls back.
pub async fn replace_family_products(
    pool: &PgPool,
    family: &str,
    products: &[NewTrendProduct],
) -> Result<(u64, u64), DbError> {
    let mut tx = pool.begin().await?;
    let counts = replace_products_in(&mut *tx, family, products).await?;
    tx.commit().await?;
    Ok(counts)
}

/// Delete-and-upsert a family's products inside the caller's transaction.
pub(crate) async fn replace_products_in(
    conn: &mut sqlx::PgConnection,
    family: &str,
    products: &[NewTrendProduct],
) -> Result<(u64, u64), DbError> {
    let deleted = sqlx::query("DELETE FROM trend_products WHERE family = $1")
        .bind(family)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let mut saved = 0u64;
    for product in products {
        sqlx::query(
            "INSERT INTO trend_products \
                 (family, trend_key, name, category, style, cut, material, color, \
                  product_brand, trend_score, trend_score_visual, saturability, \
                  trend_growth_percent, trend_label, average_price, image_url, \
                  source_url, market_zone, segment, country) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, \
                     $9, $10, $11, $12, \
                     $13, $14, $15, $16, \
                     $17, $18, $19, $20) \
             ON CONFLICT (source_url) DO UPDATE SET \
                 family               = EXCLUDED.family, \
                 trend_key            = EXCLUDED.trend_key, \
                 name                 = EXCLUDED.name, \
                 category             = EXCLUDED.category, \
                 style                = EXCLUDED.style, \
                 cut                  = EXCLUDED.cut, \
                 material             = EXCLUDED.material, \
                 color                = EXCLUDED.color, \
                 product_brand        = EXCLUDED.product_brand, \
                 trend_score          = EXCLUDED.trend_score, \
                 trend_score_visual   = EXCLUDED.trend_score_visual, \
                 saturability         = EXCLUDED.saturability, \
                 trend_growth_percent = EXCLUDED.trend_growth_percent, \
                 trend_label          = EXCLUDED.trend_label, \
                 average_price        = EXCLUDED.average_price, \
                 image_url            = EXCLUDED.image_url, \
                 market_zone          = EXCLUDED.market_zone, \
                 segment              = EXCLUDED.segment, \
                 country              = EXCLUDED.country, \
                 updated_at           = NOW()",
        )
        .bind(family)
        .bind(&product.trend_key)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.style)
        .bind(&product.cut)
        .bind(&product.material)
        .bind(&product.color)
        .bind(&product.product_brand)
        .bind(product.trend_score)
        .bind(product.trend_score_visual)
        .bind(product.saturability)
        .bind(product.trend_growth_percent)
        .bind(&product.trend_label)
        .bind(product.average_price)
        .bind(&product.image_url)
        .bind(&product.source_url)
        .bind(&product.market_zone)
        .bind(&product.segment)
        .bind(&product.country)
        .execute(&mut *conn)
        .await?;
        saved += 1;
    }

    Ok((deleted, saved))
}

/// Fetch a single product row by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_trend_product(
    pool: &PgPool,
    id: i64,
) -> Result<Option<TrendProductRow>, DbError> {
    let row = sqlx::query_as::<_, TrendProductRow>(
        "SELECT id, family, trend_key, name, category, style, cut, material, color, \
                product_brand, trend_score, trend_score_visual, saturability, \
                trend_growth_percent, trend_label, average_price, image_url, source_url, \
                market_zone, segment, country, created_at, updated_at \
         FROM trend_products WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Apply a manual indicator override to one product row.
///
/// The caller must pass the indicator set recomputed from the new
/// growth/label; score and saturability are only ever written together.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] for an unknown id, [`DbError::Sqlx`] on
/// query failure.
pub async fn update_trend_indicators(
    pool: &PgPool,
    id: i64,
    growth_percent: Option<f64>,
    label: Option<TrendLabel>,
    indicators: TrendIndicators,
) -> Result<TrendProductRow, DbError> {
    let row = sqlx::query_as::<_, TrendProductRow>(
        "UPDATE trend_products SET \
             trend_growth_percent = $1, \
             trend_label          = $2, \
             trend_score          = $3, \
             trend_score_visual   = $4, \
             saturability         = $5, \
             updated_at           = NOW() \
         WHERE id = $6 \
         RETURNING id, family, trend_key, name, category, style, cut, material, color, \
                   product_brand, trend_score, trend_score_visual, saturability, \
                   trend_growth_percent, trend_label, average_price, image_url, source_url, \
                   market_zone, segment, country, created_at, updated_at",
    )
    .bind(growth_percent)
    .bind(label.map(|l| l.to_string()))
    .bind(indicators.trend_score)
    .bind(indicators.trend_score_visual)
    .bind(indicators.saturability)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

// ---------------------------------------------------------------------------
// Read path
// ---------------------------------------------------------------------------

/// List ranked trends with their cached enrichment left-joined by
/// fingerprint.
///
/// Every row in `trend_products` corresponds to a confirmed signal — the
/// refresh pipeline only projects confirmed trends into this table.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_confirmed_trends(
    pool: &PgPool,
    filter: &TrendFilter,
    sort: TrendSort,
    limit: i64,
) -> Result<Vec<RankedTrendRow>, DbError> {
    let limit = limit.clamp(1, MAX_TREND_LIMIT);

    // The ORDER BY clause comes from a fixed enum variant, never from user
    // input, so string assembly is safe here.
    let sql = format!(
        "SELECT p.id, p.trend_key, p.name, p.category, p.style, p.cut, p.material, \
                p.color, p.product_brand, p.trend_score, p.trend_score_visual, \
                p.saturability, p.trend_growth_percent, p.trend_label, p.average_price, \
                p.image_url, p.source_url, p.market_zone, p.segment, p.country, \
                g.advice_text, g.image_url AS generated_image_url, g.rating AS advice_rating \
         FROM trend_products p \
         LEFT JOIN generated_product_images g ON g.trend_key = p.trend_key \
         WHERE ($1::text IS NULL OR p.country = $1) \
           AND ($2::text IS NULL OR p.style = $2) \
           AND ($3::text IS NULL OR p.category = $3) \
           AND ($4::text IS NULL OR p.segment = $4) \
         ORDER BY {} \
         LIMIT $5",
        sort.order_clause()
    );

    let rows = sqlx::query_as::<_, RankedTrendRow>(&sql)
        .bind(&filter.country)
        .bind(&filter.style)
        .bind(&filter.product_type)
        .bind(&filter.segment)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// One grouped count for the stats endpoint.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct StatCount {
    pub value: String,
    pub count: i64,
}

/// Grouped trend counts by country, style, and product type.
#[derive(Debug, Clone, Serialize)]
pub struct TrendStats {
    pub by_country: Vec<StatCount>,
    pub by_style: Vec<StatCount>,
    pub by_product_type: Vec<StatCount>,
}

/// Compute grouped counts over the current product set.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any of the grouped queries fail.
pub async fn trend_stats(pool: &PgPool) -> Result<TrendStats, DbError> {
    let by_country = sqlx::query_as::<_, StatCount>(
        "SELECT country AS value, COUNT(*) AS count FROM trend_products \
         WHERE country IS NOT NULL GROUP BY country ORDER BY count DESC, value ASC",
    )
    .fetch_all(pool)
    .await?;

    let by_style = sqlx::query_as::<_, StatCount>(
        "SELECT style AS value, COUNT(*) AS count FROM trend_products \
         WHERE style IS NOT NULL GROUP BY style ORDER BY count DESC, value ASC",
    )
    .fetch_all(pool)
    .await?;

    let by_product_type = sqlx::query_as::<_, StatCount>(
        "SELECT category AS value, COUNT(*) AS count FROM trend_products \
         GROUP BY category ORDER BY count DESC, value ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(TrendStats {
        by_country,
        by_style,
        by_product_type,
    })
}
