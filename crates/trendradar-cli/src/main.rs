use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "trendradar-cli")]
#[command(about = "TrendRadar command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Refresh retailer families: scrape, confirm, persist, roll up.
    Refresh {
        /// Refresh only this family; omit to refresh every configured family.
        #[arg(long)]
        family: Option<String>,
    },
    /// Run one AI enrichment batch over unenriched confirmed trends.
    Enrich {
        /// Batch size (capped at 10).
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Print the ranked confirmed trends.
    Trends {
        /// Maximum rows to print (capped at 120).
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = trendradar_core::load_app_config().context("loading configuration")?;
    let pool = trendradar_db::connect_pool(
        &config.database_url,
        trendradar_db::PoolConfig::from_app_config(&config),
    )
    .await
    .context("connecting to database")?;
    trendradar_db::run_migrations(&pool)
        .await
        .context("running migrations")?;

    match cli.command {
        Commands::Refresh { family } => run_refresh(&pool, &config, family.as_deref()).await,
        Commands::Enrich { batch_size } => run_enrich(&pool, &config, batch_size).await,
        Commands::Trends { limit } => print_trends(&pool, limit).await,
    }
}

async fn run_refresh(
    pool: &sqlx::PgPool,
    config: &trendradar_core::AppConfig,
    family_name: Option<&str>,
) -> anyhow::Result<()> {
    let retailers = trendradar_core::load_retailers(&config.retailers_path)
        .context("loading retailers config")?;

    let families: Vec<_> = match family_name {
        Some(name) => vec![retailers
            .family(name)
            .with_context(|| format!("no retailer family named '{name}'"))?
            .clone()],
        None => retailers.families.clone(),
    };

    let client = trendradar_scraper::CatalogClient::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
        config.scraper_max_retries,
        config.scraper_retry_backoff_base_secs,
    )
    .context("building catalog client")?;
    let timeout = Duration::from_secs(config.scraper_source_timeout_secs);

    for family in &families {
        let outcome = trendradar_engine::run_family_refresh(pool, &client, family, timeout)
            .await
            .with_context(|| format!("refreshing family '{}'", family.name))?;

        println!(
            "{}: {} items from {} sources -> {} signals, {} products ({} errors)",
            outcome.family,
            outcome.total_items,
            outcome.sources_count,
            outcome.saved_signals,
            outcome.saved_products,
            outcome.errors.len()
        );
        for error in &outcome.errors {
            println!("  ! {error}");
        }
    }

    Ok(())
}

async fn run_enrich(
    pool: &sqlx::PgPool,
    config: &trendradar_core::AppConfig,
    batch_size: Option<usize>,
) -> anyhow::Result<()> {
    let batch_size = batch_size.unwrap_or(config.enrich_batch_size);
    let report = trendradar_engine::run_enrichment_batch(pool, config, batch_size)
        .await
        .context("running enrichment batch")?;

    println!(
        "enriched {} of {} candidates (requested {})",
        report.enriched, report.candidates, report.requested
    );
    for error in &report.errors {
        println!("  ! {error}");
    }
    if report.quota_exhausted {
        println!("  ! provider quota exhausted; remaining candidates left for the next run");
    }

    Ok(())
}

async fn print_trends(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let rows = trendradar_db::list_confirmed_trends(
        pool,
        &trendradar_db::TrendFilter::default(),
        trendradar_db::TrendSort::default(),
        limit.clamp(1, trendradar_db::MAX_TREND_LIMIT),
    )
    .await
    .context("listing trends")?;

    if rows.is_empty() {
        println!("no confirmed trends yet; run `trendradar-cli refresh` first");
        return Ok(());
    }

    println!(
        "{:<40} {:<28} {:>5} {:>5} {:>9}  advice",
        "name", "fingerprint", "score", "sat", "price"
    );
    for row in rows {
        let price = row
            .average_price
            .map_or_else(|| "-".to_owned(), |p| p.to_string());
        let advice = row.advice_text.as_deref().unwrap_or("-");
        println!(
            "{:<40} {:<28} {:>5} {:>5} {:>9}  {}",
            truncate(&row.name, 40),
            truncate(&row.trend_key, 28),
            row.trend_score,
            row.saturability,
            price,
            truncate(advice, 60)
        );
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_owned()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
