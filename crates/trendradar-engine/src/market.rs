//! Weekly market-index rollup and read-side fallback.

use std::collections::HashMap;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::PgPool;

use trendradar_core::{synthetic_history, week_start, WeeklyPoint, MIN_REAL_POINTS};
use trendradar_db::NewTrendProduct;

use crate::error::EngineError;

/// Products with no market zone roll up under this bucket.
const GLOBAL_ZONE: &str = "global";

/// Upserts this week's index point for every (category, segment, zone)
/// combination present in the refreshed products.
///
/// The point is the plain average of the combination's trend scores and
/// saturability values. Re-running within the same ISO week overwrites the
/// week's point.
///
/// # Errors
///
/// Returns [`EngineError::Db`] if an upsert fails.
pub async fn rollup_current_week(
    pool: &PgPool,
    products: &[NewTrendProduct],
) -> Result<(), EngineError> {
    let week = week_start(Utc::now().date_naive());

    let mut groups: HashMap<(String, String, String), (f64, f64, i32)> = HashMap::new();
    for product in products {
        let zone = product
            .market_zone
            .clone()
            .unwrap_or_else(|| GLOBAL_ZONE.to_owned());
        let entry = groups
            .entry((product.category.clone(), product.segment.clone(), zone))
            .or_insert((0.0, 0.0, 0));
        entry.0 += f64::from(product.trend_score);
        entry.1 += f64::from(product.saturability);
        entry.2 += 1;
    }

    for ((category, segment, zone), (score_sum, sat_sum, count)) in groups {
        let n = f64::from(count);
        trendradar_db::upsert_week_point(
            pool,
            &category,
            &segment,
            &zone,
            week,
            score_sum / n,
            sat_sum / n,
            count,
        )
        .await?;
    }

    Ok(())
}

/// The weekly series for one combination, with its provenance.
#[derive(Debug, Clone)]
pub struct IndexHistory {
    pub points: Vec<WeeklyPoint>,
    /// `true` when the series was synthesized on read because fewer than
    /// [`MIN_REAL_POINTS`] real weeks exist. Synthetic series are never
    /// persisted.
    pub synthetic: bool,
}

/// Reads the weekly history for one (category, segment, zone) combination.
///
/// With enough real history the stored points are returned as-is. Below the
/// threshold a randomized 12-week series is generated on the fly, anchored
/// so its final point matches the latest real values exactly (or the neutral
/// baseline when no real history exists at all).
///
/// # Errors
///
/// Returns [`EngineError::Db`] if the history query fails.
pub async fn category_history(
    pool: &PgPool,
    category: &str,
    segment: &str,
    market_zone: &str,
) -> Result<IndexHistory, EngineError> {
    let rows = trendradar_db::list_category_history(pool, category, segment, market_zone).await?;

    if rows.len() >= MIN_REAL_POINTS {
        let points = rows
            .into_iter()
            .map(|r| WeeklyPoint {
                week_start: r.week_start,
                avg_trend_score: r.avg_trend_score,
                avg_saturability: r.avg_saturability,
            })
            .collect();
        return Ok(IndexHistory {
            points,
            synthetic: false,
        });
    }

    let latest = rows.last().map(|r| WeeklyPoint {
        week_start: r.week_start,
        avg_trend_score: r.avg_trend_score,
        avg_saturability: r.avg_saturability,
    });
    let fallback_week = week_start(Utc::now().date_naive());
    let mut rng = StdRng::from_os_rng();
    let points = synthetic_history(latest.as_ref(), fallback_week, &mut rng);

    Ok(IndexHistory {
        points,
        synthetic: true,
    })
}
