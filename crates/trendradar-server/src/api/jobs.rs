//! External job triggers, guarded by the shared trigger secret.

use std::time::Duration;

use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use trendradar_engine::{EngineError, EnrichmentReport, RefreshOutcome};
use trendradar_enrich::EnrichError;
use trendradar_scraper::CatalogClient;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Default, Deserialize)]
pub(super) struct RefreshRequest {
    /// Refresh only this family; absent means every configured family.
    pub family: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct EnrichRequest {
    pub batch_size: Option<usize>,
}

pub(super) async fn trigger_refresh(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Option<Json<RefreshRequest>>,
) -> Result<Json<ApiResponse<Vec<RefreshOutcome>>>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let retailers = trendradar_core::load_retailers(&state.config.retailers_path)
        .map_err(|e| {
            tracing::error!(error = %e, "retailers config failed to load");
            ApiError::new(req_id.0.clone(), "internal_error", "retailers config failed to load")
        })?;

    let families: Vec<_> = match request.family.as_deref() {
        Some(name) => {
            let family = retailers.family(name).ok_or_else(|| {
                ApiError::new(
                    req_id.0.clone(),
                    "not_found",
                    format!("no retailer family named '{name}'"),
                )
            })?;
            vec![family.clone()]
        }
        None => retailers.families.clone(),
    };

    let client = build_catalog_client(&req_id.0, &state)?;
    let timeout = Duration::from_secs(state.config.scraper_source_timeout_secs);

    let mut outcomes = Vec::with_capacity(families.len());
    for family in &families {
        let outcome = trendradar_engine::run_family_refresh(&state.pool, &client, family, timeout)
            .await
            .map_err(|e| {
                tracing::error!(family = %family.name, error = %e, "family refresh failed");
                ApiError::new(
                    req_id.0.clone(),
                    "internal_error",
                    format!("refresh of family '{}' failed", family.name),
                )
            })?;
        outcomes.push(outcome);
    }

    Ok(Json(ApiResponse {
        data: outcomes,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn trigger_enrich(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Option<Json<EnrichRequest>>,
) -> Result<Json<ApiResponse<EnrichmentReport>>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let batch_size = request
        .batch_size
        .unwrap_or(state.config.enrich_batch_size);

    let report = trendradar_engine::run_enrichment_batch(&state.pool, &state.config, batch_size)
        .await
        .map_err(|e| match e {
            EngineError::Enrich(EnrichError::ConfigurationMissing { provider }) => ApiError::new(
                req_id.0.clone(),
                "enrichment_unconfigured",
                format!("enrichment provider '{provider}' is not configured"),
            ),
            other => {
                tracing::error!(error = %other, "enrichment batch failed");
                ApiError::new(req_id.0.clone(), "internal_error", "enrichment batch failed")
            }
        })?;

    if report.quota_exhausted {
        return Err(ApiError::new(
            req_id.0,
            "quota_exceeded",
            format!(
                "provider quota exhausted after enriching {} of {} candidates",
                report.enriched, report.candidates
            ),
        ));
    }

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn build_catalog_client(request_id: &str, state: &AppState) -> Result<CatalogClient, ApiError> {
    CatalogClient::new(
        state.config.scraper_request_timeout_secs,
        &state.config.scraper_user_agent,
        state.config.scraper_max_retries,
        state.config.scraper_retry_backoff_base_secs,
    )
    .map_err(|e| {
        tracing::error!(error = %e, "catalog client construction failed");
        ApiError::new(
            request_id.to_owned(),
            "internal_error",
            "catalog client construction failed",
        )
    })
}
