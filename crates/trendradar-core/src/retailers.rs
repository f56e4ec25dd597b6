//! Retailer source configuration, loaded from YAML.
//!
//! A *family* is a named group of retailer sources refreshed together
//! (e.g. "all-trends", "zalando-trends"). Adapter configuration lives
//! entirely in this file so that scoring/confirmation logic never needs
//! to know anything retailer-specific.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One catalog endpoint to scrape: a URL scoped to a category and segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTarget {
    pub url: String,
    pub category: String,
    pub segment: String,
    pub market_zone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetailerConfig {
    pub name: String,
    pub country: Option<String>,
    pub priority: u8,
    pub sources: Vec<SourceTarget>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetailerFamily {
    pub name: String,
    /// Free-form schedule hint ("nightly", "weekly"); the actual cron
    /// expressions live in the server scheduler.
    pub schedule: Option<String>,
    pub retailers: Vec<RetailerConfig>,
}

impl RetailerFamily {
    /// Flattens all source targets of this family, paired with their retailer.
    #[must_use]
    pub fn targets(&self) -> Vec<(&RetailerConfig, &SourceTarget)> {
        self.retailers
            .iter()
            .flat_map(|r| r.sources.iter().map(move |s| (r, s)))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct RetailersFile {
    pub families: Vec<RetailerFamily>,
}

impl RetailersFile {
    /// Look up a family by name (case-insensitive).
    #[must_use]
    pub fn family(&self, name: &str) -> Option<&RetailerFamily> {
        self.families
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }
}

/// Load and validate the retailer configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_retailers(path: &Path) -> Result<RetailersFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RetailersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: RetailersFile = serde_yaml::from_str(&content)?;

    validate_retailers(&file)?;

    Ok(file)
}

fn validate_retailers(file: &RetailersFile) -> Result<(), ConfigError> {
    if file.families.is_empty() {
        return Err(ConfigError::Validation(
            "at least one family must be configured".to_string(),
        ));
    }

    let mut seen_families = HashSet::new();
    for family in &file.families {
        if family.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "family name must be non-empty".to_string(),
            ));
        }
        if !seen_families.insert(family.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate family name: '{}'",
                family.name
            )));
        }

        let mut seen_retailers = HashSet::new();
        for retailer in &family.retailers {
            if retailer.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "family '{}' has a retailer with an empty name",
                    family.name
                )));
            }
            if !seen_retailers.insert(retailer.name.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate retailer '{}' in family '{}'",
                    retailer.name, family.name
                )));
            }
            if ![1, 2, 3].contains(&retailer.priority) {
                return Err(ConfigError::Validation(format!(
                    "retailer '{}' has invalid priority {}; must be 1, 2, or 3",
                    retailer.name, retailer.priority
                )));
            }
            if retailer.sources.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "retailer '{}' has no sources configured",
                    retailer.name
                )));
            }
            for source in &retailer.sources {
                if !source.url.starts_with("http://") && !source.url.starts_with("https://") {
                    return Err(ConfigError::Validation(format!(
                        "retailer '{}' has a source with a non-HTTP url: '{}'",
                        retailer.name, source.url
                    )));
                }
                if source.category.trim().is_empty() || source.segment.trim().is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "retailer '{}' has a source missing category or segment",
                        retailer.name
                    )));
                }
            }
        }
    }

    Ok(())
}
