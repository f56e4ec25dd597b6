//! Bounded-batch enrichment driver.

use serde::Serialize;
use sqlx::PgPool;

use trendradar_core::AppConfig;
use trendradar_db::EnrichmentCandidate;
use trendradar_enrich::{build_providers, EnrichError, TrendSummary, DEFAULT_ASPECT_RATIO};

use crate::error::EngineError;

/// Hard ceiling on provider round trips per batch, whatever the caller asks.
pub const MAX_ENRICH_BATCH: usize = 10;

/// What one enrichment batch did.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentReport {
    pub requested: usize,
    pub candidates: usize,
    pub enriched: usize,
    pub errors: Vec<String>,
    /// Set when a provider reported quota exhaustion; the batch stopped
    /// spending at that point but kept its partial counts.
    pub quota_exhausted: bool,
}

/// Runs one enrichment batch: pick the highest-ranked unenriched
/// fingerprints, call both providers sequentially per candidate, cache the
/// result.
///
/// Fingerprints with cached advice are never re-sent; advice is cached even
/// when the image call fails so a later run only spends image budget.
/// Per-candidate failures are reported and the batch moves on; quota
/// exhaustion stops the batch.
///
/// # Errors
///
/// Returns [`EngineError::Enrich`] with
/// [`EnrichError::ConfigurationMissing`] before any side effect when either
/// provider is unconfigured, or [`EngineError::Db`] if candidate selection
/// fails.
pub async fn run_enrichment_batch(
    pool: &PgPool,
    config: &AppConfig,
    batch_size: usize,
) -> Result<EnrichmentReport, EngineError> {
    let (advice_client, image_client) = build_providers(config)?;

    let requested = batch_size.clamp(1, MAX_ENRICH_BATCH);
    let candidates =
        trendradar_db::list_enrichment_candidates(pool, i64::try_from(requested).unwrap_or(1))
            .await?;

    let mut report = EnrichmentReport {
        requested,
        candidates: candidates.len(),
        enriched: 0,
        errors: Vec::new(),
        quota_exhausted: false,
    };

    // One candidate at a time; parallel fan-out would burn provider quota on
    // a failing batch before anyone notices.
    for candidate in candidates {
        let summary = summarize(&candidate);

        let advice = match advice_client.generate_advice(&summary).await {
            Ok(advice) => advice,
            Err(EnrichError::QuotaExceeded { provider }) => {
                tracing::warn!(%provider, "provider quota exhausted, stopping batch");
                report.quota_exhausted = true;
                break;
            }
            Err(err) => {
                report
                    .errors
                    .push(format!("{}: {err}", candidate.trend_key));
                continue;
            }
        };

        let prompt = advice
            .image_prompt
            .clone()
            .unwrap_or_else(|| summary.default_image_prompt());

        let (image_url, image_quota_hit) =
            match image_client.generate_image(&prompt, DEFAULT_ASPECT_RATIO).await {
                Ok(url) => (Some(url), false),
                Err(EnrichError::QuotaExceeded { provider }) => {
                    tracing::warn!(%provider, "provider quota exhausted, stopping batch");
                    (None, true)
                }
                Err(err) => {
                    report
                        .errors
                        .push(format!("{}: {err}", candidate.trend_key));
                    (None, false)
                }
            };

        trendradar_db::upsert_generated_image(
            pool,
            &candidate.trend_key,
            &prompt,
            image_url.as_deref(),
            Some(&advice.advice),
            advice.rating,
        )
        .await?;
        report.enriched += 1;

        if image_quota_hit {
            report.quota_exhausted = true;
            break;
        }
    }

    tracing::info!(
        requested = report.requested,
        candidates = report.candidates,
        enriched = report.enriched,
        errors = report.errors.len(),
        quota_exhausted = report.quota_exhausted,
        "enrichment batch complete"
    );
    Ok(report)
}

fn summarize(candidate: &EnrichmentCandidate) -> TrendSummary {
    TrendSummary {
        trend_key: candidate.trend_key.clone(),
        name: candidate.name.clone(),
        category: candidate.category.clone(),
        cut: candidate.cut.clone(),
        material: candidate.material.clone(),
        color: candidate.color.clone(),
        style: candidate.style.clone(),
        segment: candidate.segment.clone(),
        average_price: candidate.average_price,
    }
}
