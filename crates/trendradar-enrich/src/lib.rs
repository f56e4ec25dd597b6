//! Clients for the two AI enrichment providers: merchandising advice (LLM
//! chat completions) and product-card imagery (image generation).
//!
//! Both providers are optional at the configuration level; [`build_providers`]
//! is the single gate that decides whether enrichment can run at all.

pub mod error;
pub mod image;
pub mod llm;
pub mod types;

pub use error::EnrichError;
pub use image::{ImageClient, DEFAULT_ASPECT_RATIO};
pub use llm::AdviceClient;
pub use types::{TrendAdvice, TrendSummary};

/// Builds both provider clients from the application configuration.
///
/// # Errors
///
/// Returns [`EnrichError::ConfigurationMissing`] naming the first provider
/// whose URL or API key is absent. Callers must treat this as a
/// before-any-side-effect failure of the whole enrichment call.
pub fn build_providers(
    config: &trendradar_core::AppConfig,
) -> Result<(AdviceClient, ImageClient), EnrichError> {
    let missing = |provider: &str| EnrichError::ConfigurationMissing {
        provider: provider.to_owned(),
    };

    let llm_url = config.llm_api_url.as_deref().ok_or_else(|| missing("llm"))?;
    let llm_key = config.llm_api_key.as_deref().ok_or_else(|| missing("llm"))?;
    let image_url = config
        .image_api_url
        .as_deref()
        .ok_or_else(|| missing("image"))?;
    let image_key = config
        .image_api_key
        .as_deref()
        .ok_or_else(|| missing("image"))?;

    let advice = AdviceClient::new(
        llm_url,
        llm_key,
        &config.llm_model,
        config.enrich_request_timeout_secs,
    )?;
    let image = ImageClient::new(image_url, image_key, config.enrich_request_timeout_secs)?;
    Ok((advice, image))
}
