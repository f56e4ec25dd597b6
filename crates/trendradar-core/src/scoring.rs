//! Pure trend scoring.
//!
//! Both indicators are always recomputed together through
//! [`recompute_indicators`] so that `trend_score` and `saturability` can never
//! drift apart after a manual edit or a batch refresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Score returned when neither growth nor label is known.
pub const NEUTRAL_BASELINE: i16 = 50;

/// Growth contribution per percentage point, capped at ±[`GROWTH_CAP`].
const GROWTH_SLOPE: f64 = 0.4;
const GROWTH_CAP: f64 = 50.0;

/// Saturability rises by this much per day on the radar, up to [`AGE_CAP_DAYS`].
const AGE_SLOPE: f64 = 0.5;
const AGE_CAP_DAYS: i64 = 120;

/// Positive growth relieves saturation by this factor, capped at 30 points.
const GROWTH_RELIEF: f64 = 0.3;
const GROWTH_RELIEF_CAP: f64 = 30.0;

const SATURABILITY_BASELINE: f64 = 20.0;

/// Categorical momentum label attached to a trend, either by the refresh
/// pipeline or by a manual indicator edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    Emerging,
    Rising,
    Peaking,
    Declining,
}

impl TrendLabel {
    /// Bounded shift applied to the trend score (within ±15).
    fn score_shift(self) -> f64 {
        match self {
            TrendLabel::Emerging => 5.0,
            TrendLabel::Rising => 15.0,
            TrendLabel::Peaking => 8.0,
            TrendLabel::Declining => -15.0,
        }
    }

    /// Bounded shift applied to saturability (within ±15).
    fn saturation_shift(self) -> f64 {
        match self {
            TrendLabel::Emerging => -10.0,
            TrendLabel::Rising => -5.0,
            TrendLabel::Peaking => 10.0,
            TrendLabel::Declining => 15.0,
        }
    }
}

impl std::str::FromStr for TrendLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "emerging" => Ok(TrendLabel::Emerging),
            "rising" => Ok(TrendLabel::Rising),
            "peaking" => Ok(TrendLabel::Peaking),
            "declining" => Ok(TrendLabel::Declining),
            other => Err(format!("unknown trend label: '{other}'")),
        }
    }
}

impl std::fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendLabel::Emerging => write!(f, "emerging"),
            TrendLabel::Rising => write!(f, "rising"),
            TrendLabel::Peaking => write!(f, "peaking"),
            TrendLabel::Declining => write!(f, "declining"),
        }
    }
}

/// The score/saturability pair plus the smoothed display variant, always
/// produced together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendIndicators {
    pub trend_score: i16,
    pub trend_score_visual: i16,
    pub saturability: i16,
}

fn clamp_score(raw: f64) -> i16 {
    #[allow(clippy::cast_possible_truncation)]
    let clamped = raw.clamp(0.0, 100.0).round() as i16;
    clamped
}

fn finite_or_zero(growth: Option<f64>) -> f64 {
    growth.filter(|g| g.is_finite()).unwrap_or(0.0)
}

/// Trend strength in `[0, 100]`.
///
/// Absent inputs fall back to [`NEUTRAL_BASELINE`] rather than erroring:
/// a freshly confirmed trend has no growth history yet. Monotonically
/// non-decreasing in `growth_percent` for a fixed label.
#[must_use]
pub fn trend_score(growth_percent: Option<f64>, label: Option<TrendLabel>) -> i16 {
    let growth = finite_or_zero(growth_percent);
    let shift = label.map_or(0.0, TrendLabel::score_shift);
    let raw = f64::from(NEUTRAL_BASELINE) + (growth * GROWTH_SLOPE).clamp(-GROWTH_CAP, GROWTH_CAP)
        + shift;
    clamp_score(raw)
}

/// How overexposed a trend is, in `[0, 100]`.
///
/// Non-decreasing in `days_on_radar` (older means at least as saturated) and
/// non-increasing in positive growth (a still-rising trend is less saturated).
#[must_use]
pub fn saturability(
    growth_percent: Option<f64>,
    label: Option<TrendLabel>,
    days_on_radar: i64,
) -> i16 {
    let growth = finite_or_zero(growth_percent);
    #[allow(clippy::cast_precision_loss)]
    let age = days_on_radar.clamp(0, AGE_CAP_DAYS) as f64 * AGE_SLOPE;
    let relief = (growth.max(0.0) * GROWTH_RELIEF).min(GROWTH_RELIEF_CAP);
    let shift = label.map_or(0.0, TrendLabel::saturation_shift);
    clamp_score(SATURABILITY_BASELINE + age - relief + shift)
}

/// Compresses a raw score into `[8, 97]` for display, so dashboard gauges
/// never sit flat against either end of the dial.
fn visual_score(score: i16) -> i16 {
    clamp_score(8.0 + f64::from(score) * 0.89)
}

/// Recompute the full indicator set from its inputs.
///
/// `first_seen_at` anchors the age used by [`saturability`]; a `now` earlier
/// than `first_seen_at` counts as zero days on the radar.
#[must_use]
pub fn recompute_indicators(
    growth_percent: Option<f64>,
    label: Option<TrendLabel>,
    first_seen_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> TrendIndicators {
    let days_on_radar = (now - first_seen_at).num_days().max(0);
    let score = trend_score(growth_percent, label);
    TrendIndicators {
        trend_score: score,
        trend_score_visual: visual_score(score),
        saturability: saturability(growth_percent, label, days_on_radar),
    }
}
