use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use trendradar_core::WeeklyPoint;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    pub category: Option<String>,
    pub segment: Option<String>,
    /// Defaults to the zoneless rollup bucket.
    pub market_zone: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct HistoryData {
    pub category: String,
    pub segment: String,
    pub market_zone: String,
    pub points: Vec<WeeklyPoint>,
    /// `true` when too little real history exists and the series was
    /// synthesized for display. Synthetic series are never persisted.
    pub synthetic: bool,
}

pub(super) async fn market_index_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<HistoryData>>, ApiError> {
    let category = require_param(&req_id.0, "category", query.category)?;
    let segment = require_param(&req_id.0, "segment", query.segment)?;
    let market_zone = query.market_zone.unwrap_or_else(|| "global".to_owned());

    let history =
        trendradar_engine::category_history(&state.pool, &category, &segment, &market_zone)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "market-index history query failed");
                ApiError::new(
                    req_id.0.clone(),
                    "internal_error",
                    "market-index history query failed",
                )
            })?;

    Ok(Json(ApiResponse {
        data: HistoryData {
            category,
            segment,
            market_zone,
            points: history.points,
            synthetic: history.synthetic,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn require_param(
    request_id: &str,
    name: &str,
    value: Option<String>,
) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ApiError::new(
                request_id.to_owned(),
                "validation_error",
                format!("query parameter '{name}' is required"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_param_rejects_missing_and_blank() {
        assert!(require_param("rid", "category", None).is_err());
        assert!(require_param("rid", "category", Some("  ".to_owned())).is_err());
        assert_eq!(
            require_param("rid", "category", Some(" hoodie ".to_owned())).unwrap(),
            "hoodie"
        );
    }
}
