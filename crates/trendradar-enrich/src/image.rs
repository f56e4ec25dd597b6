//! Image-generation client: prompt in, hosted image URL out.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::EnrichError;

const PROVIDER: &str = "image";

/// Portrait ratio matching product-card layouts.
pub const DEFAULT_ASPECT_RATIO: &str = "3:4";

pub struct ImageClient {
    client: Client,
    url: String,
    api_key: String,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    prompt: &'a str,
    aspect_ratio: &'a str,
    n: u8,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    url: Option<String>,
}

impl ImageClient {
    /// Creates a client for the image-generation endpoint at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, EnrichError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/images/generations", api_url.trim_end_matches('/')),
            api_key: api_key.to_owned(),
        })
    }

    /// Generates one image and returns its hosted URL.
    ///
    /// # Errors
    ///
    /// - [`EnrichError::QuotaExceeded`] — HTTP 402, or a 429 whose body names
    ///   a quota problem.
    /// - [`EnrichError::UnexpectedStatus`] — any other non-2xx status.
    /// - [`EnrichError::Http`] — network failure.
    /// - [`EnrichError::MalformedCompletion`] — response carries no image URL.
    pub async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<String, EnrichError> {
        let request = ImageRequest {
            prompt,
            aspect_ratio,
            n: 1,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::PAYMENT_REQUIRED {
            return Err(EnrichError::QuotaExceeded {
                provider: PROVIDER.to_owned(),
            });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            if body.contains("quota") {
                return Err(EnrichError::QuotaExceeded {
                    provider: PROVIDER.to_owned(),
                });
            }
            return Err(EnrichError::UnexpectedStatus {
                provider: PROVIDER.to_owned(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(EnrichError::UnexpectedStatus {
                provider: PROVIDER.to_owned(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: ImageResponse =
            serde_json::from_str(&body).map_err(|e| EnrichError::Deserialize {
                context: "image generation".to_owned(),
                source: e,
            })?;

        parsed
            .data
            .into_iter()
            .find_map(|d| d.url)
            .ok_or_else(|| EnrichError::MalformedCompletion {
                provider: PROVIDER.to_owned(),
                reason: "response carries no image URL".into(),
            })
    }
}
