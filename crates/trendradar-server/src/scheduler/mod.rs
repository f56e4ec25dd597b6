//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring refresh and enrichment jobs.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Registers the nightly per-family refresh and the six-hourly enrichment
/// batch, then starts the scheduler. Returns the running [`JobScheduler`]
/// handle, which must be kept alive for the lifetime of the process —
/// dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<trendradar_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_refresh_job(&scheduler, pool.clone(), Arc::clone(&config)).await?;
    register_enrich_job(&scheduler, pool, config).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the nightly catalog refresh, 03:00 UTC (`0 0 3 * * *`), covering
/// every configured retailer family.
async fn register_refresh_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<trendradar_core::AppConfig>,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async("0 0 3 * * *", move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!("scheduler: starting nightly refresh run");
            run_refresh_job(&pool, &config).await;
            tracing::info!("scheduler: nightly refresh run complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Register the enrichment batch, every six hours (`0 0 */6 * * *`).
async fn register_enrich_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<trendradar_core::AppConfig>,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async("0 0 */6 * * *", move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!("scheduler: starting enrichment batch");
            run_enrich_job(&pool, &config).await;
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Drive a refresh of every configured family, one at a time.
async fn run_refresh_job(pool: &PgPool, config: &trendradar_core::AppConfig) {
    let retailers = match trendradar_core::load_retailers(&config.retailers_path) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: retailers config failed to load");
            return;
        }
    };

    let client = match trendradar_scraper::CatalogClient::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
        config.scraper_max_retries,
        config.scraper_retry_backoff_base_secs,
    ) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: catalog client construction failed");
            return;
        }
    };

    let timeout = Duration::from_secs(config.scraper_source_timeout_secs);
    for family in &retailers.families {
        match trendradar_engine::run_family_refresh(pool, &client, family, timeout).await {
            Ok(outcome) => {
                tracing::info!(
                    family = %outcome.family,
                    products = outcome.saved_products,
                    errors = outcome.errors.len(),
                    "scheduler: family refreshed"
                );
            }
            Err(e) => {
                // One broken family must not starve the others.
                tracing::error!(family = %family.name, error = %e, "scheduler: family refresh failed");
            }
        }
    }
}

/// Drive one enrichment batch with the configured batch size.
async fn run_enrich_job(pool: &PgPool, config: &trendradar_core::AppConfig) {
    match trendradar_engine::run_enrichment_batch(pool, config, config.enrich_batch_size).await {
        Ok(report) => {
            if report.quota_exhausted {
                tracing::warn!(
                    enriched = report.enriched,
                    "scheduler: enrichment stopped on quota exhaustion"
                );
            } else {
                tracing::info!(
                    enriched = report.enriched,
                    errors = report.errors.len(),
                    "scheduler: enrichment batch complete"
                );
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "scheduler: enrichment batch failed");
        }
    }
}
