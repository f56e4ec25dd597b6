//! Database operations for `trend_signals`.
//!
//! Signals are replaced wholesale per family on each refresh; there are no
//! row-level updates. The grouping key (product_type, cut, material) is
//! intentionally non-unique.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `trend_signals` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendSignalRow {
    pub id: i64,
    pub family: String,
    pub product_type: String,
    pub cut: String,
    pub material: String,
    pub color: Option<String>,
    pub style: Option<String>,
    pub country: Option<String>,
    pub segment: String,
    pub market_zone: Option<String>,
    pub brands: Vec<String>,
    pub average_price: Option<Decimal>,
    pub observation_count: i32,
    pub confirmation_score: i32,
    pub is_confirmed: bool,
    pub first_seen_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for one signal, produced by the grouper.
#[derive(Debug, Clone)]
pub struct NewTrendSignal {
    pub product_type: String,
    pub cut: String,
    pub material: String,
    pub color: Option<String>,
    pub style: Option<String>,
    pub country: Option<String>,
    pub segment: String,
    pub market_zone: Option<String>,
    pub brands: Vec<String>,
    pub average_price: Option<Decimal>,
    pub observation_count: i32,
    pub confirmation_score: i32,
    pub is_confirmed: bool,
    pub first_seen_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub source_url: Option<String>,
}

impl From<&trendradar_core::TrendSignal> for NewTrendSignal {
    fn from(signal: &trendradar_core::TrendSignal) -> Self {
        Self {
            product_type: signal.product_type.clone(),
            cut: signal.cut.clone(),
            material: signal.material.clone(),
            color: signal.color.clone(),
            style: signal.style.clone(),
            country: signal.country.clone(),
            segment: signal.segment.clone(),
            market_zone: signal.market_zone.clone(),
            brands: signal.brands.iter().cloned().collect(),
            average_price: signal.average_price,
            observation_count: i32::try_from(signal.observation_count).unwrap_or(i32::MAX),
            confirmation_score: i32::try_from(signal.confirmation_score).unwrap_or(i32::MAX),
            is_confirmed: signal.is_confirmed,
            first_seen_at: signal.first_seen_at,
            confirmed_at: signal.confirmed_at,
            source_url: Some(signal.source_url.clone()),
        }
    }
}

/// Replace all signals of one family in a single transaction.
///
/// Full delete+recreate is the refresh contract: partial recomputation never
/// runs against this table, so the brand-quorum window is exactly one cycle.
/// Returns `(deleted_count, saved_count)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction rolls
/// back and the previous cycle's rows remain visible to readers.
pub async fn replace_family_signals(
    pool: &PgPool,
    family: &str,
    signals: &[NewTrendSignal],
) -> Result<(u64, u64), DbError> {
    let mut tx = pool.begin().await?;
    let counts = replace_signals_in(&mut *tx, family, signals).await?;
    tx.commit().await?;
    Ok(counts)
}

/// Delete-and-insert a family's signals inside the caller's transaction.
pub(crate) async fn replace_signals_in(
    conn: &mut sqlx::PgConnection,
    family: &str,
    signals: &[NewTrendSignal],
) -> Result<(u64, u64), DbError> {
    let deleted = sqlx::query("DELETE FROM trend_signals WHERE family = $1")
        .bind(family)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let mut saved = 0u64;
    for signal in signals {
        sqlx::query(
            "INSERT INTO trend_signals \
                 (family, product_type, cut, material, color, style, country, segment, \
                  market_zone, brands, average_price, observation_count, confirmation_score, \
                  is_confirmed, first_seen_at, confirmed_at, source_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, \
                     $9, $10, $11, $12, $13, \
                     $14, $15, $16, $17)",
        )
        .bind(family)
        .bind(&signal.product_type)
        .bind(&signal.cut)
        .bind(&signal.material)
        .bind(&signal.color)
        .bind(&signal.style)
        .bind(&signal.country)
        .bind(&signal.segment)
        .bind(&signal.market_zone)
        .bind(&signal.brands)
        .bind(signal.average_price)
        .bind(signal.observation_count)
        .bind(signal.confirmation_score)
        .bind(signal.is_confirmed)
        .bind(signal.first_seen_at)
        .bind(signal.confirmed_at)
        .bind(&signal.source_url)
        .execute(&mut *conn)
        .await?;
        saved += 1;
    }

    Ok((deleted, saved))
}

/// Count the signals currently stored for a family.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_family_signals(pool: &PgPool, family: &str) -> Result<i64, DbError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM trend_signals WHERE family = $1")
            .bind(family)
            .fetch_one(pool)
            .await?;
    Ok(count)
}
