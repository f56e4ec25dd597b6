//! Chat-completion client that turns a trend archetype into merchandising
//! advice.
//!
//! The provider speaks the OpenAI chat-completions dialect. The model is
//! asked for a JSON object; when it answers with plain prose instead, the
//! whole completion becomes the advice text and the image prompt falls back
//! to a derived default.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::EnrichError;
use crate::types::{TrendAdvice, TrendSummary};

const PROVIDER: &str = "llm";

pub struct AdviceClient {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl AdviceClient {
    /// Creates a client for the chat-completions endpoint at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, EnrichError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/chat/completions", api_url.trim_end_matches('/')),
            api_key: api_key.to_owned(),
            model: model.to_owned(),
        })
    }

    /// Requests merchandising advice for one trend archetype.
    ///
    /// # Errors
    ///
    /// - [`EnrichError::QuotaExceeded`] — HTTP 402, or a 429 whose body names
    ///   a quota problem rather than rate limiting.
    /// - [`EnrichError::UnexpectedStatus`] — any other non-2xx status.
    /// - [`EnrichError::Http`] — network failure.
    /// - [`EnrichError::MalformedCompletion`] — empty choices or null content.
    pub async fn generate_advice(
        &self,
        summary: &TrendSummary,
    ) -> Result<TrendAdvice, EnrichError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are a fashion-retail buying advisor. Answer with a JSON \
                              object: {\"advice\": string, \"rating\": integer 1-5, \
                              \"image_prompt\": string}."
                        .to_owned(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "A confirmed cross-retailer trend: {}. Give concise buying advice \
                         for a boutique owner.",
                        summary.describe()
                    ),
                },
            ],
            temperature: 0.4,
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
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| EnrichError::Deserialize {
                context: format!("chat completion for {}", summary.trend_key),
                source: e,
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| EnrichError::MalformedCompletion {
                provider: PROVIDER.to_owned(),
                reason: "response has no completion content".into(),
            })?;

        Ok(parse_advice(&content))
    }
}

/// Interprets the completion content: structured JSON when the model obeyed,
/// otherwise the prose itself becomes the advice.
fn parse_advice(content: &str) -> TrendAdvice {
    // Models sometimes wrap the object in a markdown fence.
    let stripped = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    if let Ok(advice) = serde_json::from_str::<TrendAdvice>(stripped) {
        let rating = advice.rating.filter(|r| (1..=5).contains(r));
        return TrendAdvice { rating, ..advice };
    }

    TrendAdvice {
        advice: content.trim().to_owned(),
        rating: None,
        image_prompt: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_json_is_parsed() {
        let advice = parse_advice(
            r#"{"advice": "Stock it now.", "rating": 4, "image_prompt": "hoodie photo"}"#,
        );
        assert_eq!(advice.advice, "Stock it now.");
        assert_eq!(advice.rating, Some(4));
        assert_eq!(advice.image_prompt.as_deref(), Some("hoodie photo"));
    }

    #[test]
    fn fenced_json_is_parsed() {
        let advice =
            parse_advice("```json\n{\"advice\": \"Buy.\", \"rating\": 5, \"image_prompt\": null}\n```");
        assert_eq!(advice.advice, "Buy.");
        assert_eq!(advice.rating, Some(5));
    }

    #[test]
    fn prose_falls_back_to_advice_text() {
        let advice = parse_advice("This hoodie is trending, stock two colorways.");
        assert_eq!(advice.advice, "This hoodie is trending, stock two colorways.");
        assert!(advice.rating.is_none());
        assert!(advice.image_prompt.is_none());
    }

    #[test]
    fn out_of_range_rating_is_dropped() {
        let advice = parse_advice(r#"{"advice": "Buy.", "rating": 11, "image_prompt": null}"#);
        assert!(advice.rating.is_none());
    }
}
