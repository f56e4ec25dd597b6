pub mod client;
pub mod collect;
pub mod error;
pub mod normalize;
pub mod parse;
mod rate_limit;
pub mod types;

pub use client::CatalogClient;
pub use collect::{collect_family_items, CollectionReport, SourceFailure};
pub use error::ScraperError;
pub use normalize::normalize_listing;
pub use types::{CatalogResponse, RawListing, RawPrice};
