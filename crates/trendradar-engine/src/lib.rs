//! Orchestration of the trend pipeline: family refresh, enrichment batches,
//! and the weekly market index.

pub mod enrich;
pub mod error;
pub mod market;
pub mod refresh;

pub use enrich::{run_enrichment_batch, EnrichmentReport, MAX_ENRICH_BATCH};
pub use error::EngineError;
pub use market::{category_history, rollup_current_week, IndexHistory};
pub use refresh::{run_family_refresh, RefreshOutcome};
