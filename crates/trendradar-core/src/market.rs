//! Weekly market-index series and the synthetic display fallback.
//!
//! Real weekly aggregates are persisted by the engine; when a
//! (category, segment, zone) combination has too little history to chart,
//! a randomized backfill is generated on read. Synthetic points are a
//! display fallback only and are never written back to the store.

use chrono::{Datelike, Duration, NaiveDate};
use rand::Rng;
use serde::Serialize;

/// Minimum number of real weekly points before the real series is charted
/// as-is.
pub const MIN_REAL_POINTS: usize = 5;

/// Length of the synthetic fallback series.
pub const SYNTHETIC_SERIES_LEN: usize = 12;

/// Neutral anchor used when a combination has no real history at all.
const NEUTRAL_ANCHOR: f64 = 50.0;

/// Week-over-week jitter amplitude of the synthetic walk.
const JITTER: f64 = 4.0;

/// One weekly aggregate of trend strength and saturation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyPoint {
    pub week_start: NaiveDate,
    pub avg_trend_score: f64,
    pub avg_saturability: f64,
}

/// Monday of the ISO week containing `date`, used as the series bucket.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Generate a [`SYNTHETIC_SERIES_LEN`]-point weekly series ending at the
/// latest real point.
///
/// The walk runs backwards from the anchor with bounded random jitter, so the
/// final point always equals the true latest values exactly — synthetic
/// history bends toward reality, never the other way around. With no real
/// history the series anchors on the neutral baseline at `fallback_week`.
pub fn synthetic_history<R: Rng + ?Sized>(
    latest: Option<&WeeklyPoint>,
    fallback_week: NaiveDate,
    rng: &mut R,
) -> Vec<WeeklyPoint> {
    let (anchor_week, anchor_score, anchor_saturability) = match latest {
        Some(point) => (point.week_start, point.avg_trend_score, point.avg_saturability),
        None => (week_start(fallback_week), NEUTRAL_ANCHOR, NEUTRAL_ANCHOR),
    };

    let mut series = Vec::with_capacity(SYNTHETIC_SERIES_LEN);
    let mut score = anchor_score;
    let mut saturability = anchor_saturability;

    for offset in 0..SYNTHETIC_SERIES_LEN {
        let weeks_back = i64::try_from(offset).unwrap_or(0);
        series.push(WeeklyPoint {
            week_start: anchor_week - Duration::weeks(weeks_back),
            avg_trend_score: score,
            avg_saturability: saturability,
        });
        score = (score + rng.random_range(-JITTER..=JITTER)).clamp(0.0, 100.0);
        saturability = (saturability + rng.random_range(-JITTER..=JITTER)).clamp(0.0, 100.0);
    }

    series.reverse();
    series
}
