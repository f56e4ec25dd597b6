//! Database operations for `market_index_points`, the weekly series.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `market_index_points` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct MarketIndexPointRow {
    pub id: i64,
    pub category: String,
    pub segment: String,
    pub market_zone: String,
    pub week_start: NaiveDate,
    pub avg_trend_score: f64,
    pub avg_saturability: f64,
    pub sample_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Upsert the weekly aggregate for one (category, segment, zone, week).
///
/// Re-running a refresh within the same week overwrites the week's point
/// rather than appending — the series stays one point per week.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_week_point(
    pool: &PgPool,
    category: &str,
    segment: &str,
    market_zone: &str,
    week_start: NaiveDate,
    avg_trend_score: f64,
    avg_saturability: f64,
    sample_count: i32,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO market_index_points \
             (category, segment, market_zone, week_start, avg_trend_score, \
              avg_saturability, sample_count) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (category, segment, market_zone, week_start) DO UPDATE SET \
             avg_trend_score  = EXCLUDED.avg_trend_score, \
             avg_saturability = EXCLUDED.avg_saturability, \
             sample_count     = EXCLUDED.sample_count",
    )
    .bind(category)
    .bind(segment)
    .bind(market_zone)
    .bind(week_start)
    .bind(avg_trend_score)
    .bind(avg_saturability)
    .bind(sample_count)
    .execute(pool)
    .await?;

    Ok(())
}

/// List the real weekly series for one combination, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_category_history(
    pool: &PgPool,
    category: &str,
    segment: &str,
    market_zone: &str,
) -> Result<Vec<MarketIndexPointRow>, DbError> {
    let rows = sqlx::query_as::<_, MarketIndexPointRow>(
        "SELECT id, category, segment, market_zone, week_start, avg_trend_score, \
                avg_saturability, sample_count, created_at \
         FROM market_index_points \
         WHERE category = $1 AND segment = $2 AND market_zone = $3 \
         ORDER BY week_start ASC",
    )
    .bind(category)
    .bind(segment)
    .bind(market_zone)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetch the most recent real point for one combination, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_week_point(
    pool: &PgPool,
    category: &str,
    segment: &str,
    market_zone: &str,
) -> Result<Option<MarketIndexPointRow>, DbError> {
    let row = sqlx::query_as::<_, MarketIndexPointRow>(
        "SELECT id, category, segment, market_zone, week_start, avg_trend_score, \
                avg_saturability, sample_count, created_at \
         FROM market_index_points \
         WHERE category = $1 AND segment = $2 AND market_zone = $3 \
         ORDER BY week_start DESC \
         LIMIT 1",
    )
    .bind(category)
    .bind(segment)
    .bind(market_zone)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
