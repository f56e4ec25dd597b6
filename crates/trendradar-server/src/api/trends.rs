use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;

use trendradar_core::{recompute_indicators, TrendLabel};
use trendradar_db::{RankedTrendRow, TrendFilter, TrendProductRow, TrendSort, TrendStats};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct TrendQuery {
    pub country: Option<String>,
    pub style: Option<String>,
    pub product_type: Option<String>,
    pub segment: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
}

pub(super) async fn list_trends(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<ApiResponse<Vec<RankedTrendRow>>>, ApiError> {
    let sort = match query.sort.as_deref() {
        None => TrendSort::default(),
        Some(raw) => TrendSort::from_str(raw).map_err(|e| {
            ApiError::new(
                req_id.0.clone(),
                "validation_error",
                format!("{e}; expected saturability, trend_score, or price"),
            )
        })?,
    };

    let filter = TrendFilter {
        country: query.country,
        style: query.style,
        product_type: query.product_type,
        segment: query.segment,
    }
    .normalized();

    let rows = trendradar_db::list_confirmed_trends(
        &state.pool,
        &filter,
        sort,
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn trend_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<TrendStats>>, ApiError> {
    let stats = trendradar_db::trend_stats(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: stats,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct IndicatorsPatch {
    pub trend_growth_percent: Option<f64>,
    pub trend_label: Option<String>,
}

/// Manual growth/label override: recomputes score and saturability together,
/// never one without the other.
pub(super) async fn update_indicators(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(patch): Json<IndicatorsPatch>,
) -> Result<Json<ApiResponse<TrendProductRow>>, ApiError> {
    if patch
        .trend_growth_percent
        .is_some_and(|g| !g.is_finite())
    {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "trend_growth_percent must be a finite number",
        ));
    }

    let label = match patch.trend_label.as_deref() {
        None => None,
        Some(raw) => Some(TrendLabel::from_str(raw).map_err(|e| {
            ApiError::new(req_id.0.clone(), "validation_error", e)
        })?),
    };

    let existing = trendradar_db::get_trend_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(req_id.0.clone(), "not_found", format!("no trend with id {id}"))
        })?;

    // The row's creation stamp doubles as the first-seen anchor for the
    // saturability age term.
    let indicators = recompute_indicators(
        patch.trend_growth_percent,
        label,
        existing.created_at,
        Utc::now(),
    );

    let updated = trendradar_db::update_trend_indicators(
        &state.pool,
        id,
        patch.trend_growth_percent,
        label,
        indicators,
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: updated,
        meta: ResponseMeta::new(req_id.0),
    }))
}
