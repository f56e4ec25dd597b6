use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] trendradar_core::ConfigError),

    #[error(transparent)]
    Db(#[from] trendradar_db::DbError),

    #[error(transparent)]
    Scraper(#[from] trendradar_scraper::ScraperError),

    #[error(transparent)]
    Enrich(#[from] trendradar_enrich::EnrichError),
}
