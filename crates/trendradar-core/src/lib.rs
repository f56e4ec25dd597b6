pub mod app_config;
pub mod config;
pub mod market;
pub mod retailers;
pub mod scoring;
pub mod signals;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use market::{week_start, synthetic_history, WeeklyPoint, MIN_REAL_POINTS, SYNTHETIC_SERIES_LEN};
pub use retailers::{
    load_retailers, RetailerConfig, RetailerFamily, RetailersFile, SourceTarget,
};
pub use scoring::{
    recompute_indicators, saturability, trend_score, TrendIndicators, TrendLabel,
    NEUTRAL_BASELINE,
};
pub use signals::{
    trend_key, ScrapedItem, SignalAccumulator, SignalError, TrendSignal, BRAND_QUORUM,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read retailers file {path}: {source}")]
    RetailersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse retailers file: {0}")]
    RetailersFileParse(#[from] serde_yaml::Error),
    #[error("retailers config validation failed: {0}")]
    Validation(String),
}
