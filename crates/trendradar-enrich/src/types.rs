//! Shared types for the enrichment providers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Structured merchandising advice returned by the LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendAdvice {
    pub advice: String,
    /// 1-5 buy-signal rating; absent when the model skipped it.
    pub rating: Option<i16>,
    /// Prompt for the image provider; absent means use a derived default.
    pub image_prompt: Option<String>,
}

/// The facts about a trend archetype that go into the provider prompts.
/// Deliberately decoupled from any database row type.
#[derive(Debug, Clone)]
pub struct TrendSummary {
    pub trend_key: String,
    pub name: String,
    pub category: String,
    pub cut: String,
    pub material: String,
    pub color: Option<String>,
    pub style: Option<String>,
    pub segment: String,
    pub average_price: Option<Decimal>,
}

impl TrendSummary {
    /// One-line description used in both provider prompts.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut parts = vec![self.cut.clone(), self.material.clone(), self.category.clone()];
        if let Some(color) = &self.color {
            parts.insert(0, color.clone());
        }
        let mut description = parts
            .iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(style) = &self.style {
            description.push_str(&format!(" ({style})"));
        }
        description.push_str(&format!(", {} segment", self.segment));
        if let Some(price) = &self.average_price {
            description.push_str(&format!(", around {price} EUR"));
        }
        description
    }

    /// Fallback image prompt when the LLM did not supply one.
    #[must_use]
    pub fn default_image_prompt(&self) -> String {
        format!(
            "studio product photograph of a {}, neutral background, soft lighting",
            self.describe()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> TrendSummary {
        TrendSummary {
            trend_key: "hoodie|oversize|cotton".to_owned(),
            name: "Oversize Hoodie".to_owned(),
            category: "hoodie".to_owned(),
            cut: "oversize".to_owned(),
            material: "cotton".to_owned(),
            color: Some("black".to_owned()),
            style: Some("streetwear".to_owned()),
            segment: "womenswear".to_owned(),
            average_price: Some("29.99".parse().unwrap()),
        }
    }

    #[test]
    fn describe_reads_naturally() {
        assert_eq!(
            summary().describe(),
            "black oversize cotton hoodie (streetwear), womenswear segment, around 29.99 EUR"
        );
    }

    #[test]
    fn describe_skips_absent_fields() {
        let mut s = summary();
        s.color = None;
        s.style = None;
        s.average_price = None;
        assert_eq!(s.describe(), "oversize cotton hoodie, womenswear segment");
    }

    #[test]
    fn default_image_prompt_embeds_description() {
        assert!(summary()
            .default_image_prompt()
            .contains("black oversize cotton hoodie"));
    }
}
