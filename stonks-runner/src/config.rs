//! Scrape configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) describes
//! the standard run: two S&P 500 listing pages, USD→RUB, top 10 per view.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stonks_core::source::{HttpOptions, DEFAULT_USER_AGENT};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything one scrape run needs to know.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScrapeConfig {
    /// Site root; listing and detail links resolve against it.
    pub base_url: String,

    /// Listing path with a `{page}` placeholder for the 1-based page number.
    pub listing_path: String,

    /// Daily rates XML document.
    pub rate_url: String,

    /// Identifier of the currency to convert from (`R01235` is USD).
    pub currency_id: String,

    /// Listing pages to walk, `1..=pages`.
    pub pages: u32,

    /// Upper bound on concurrent detail-page requests.
    pub max_in_flight: usize,

    pub request_timeout_secs: u64,

    /// Extra attempts per request for transient failures.
    pub max_retries: u32,

    /// Entries kept per ranked view.
    pub top_n: usize,

    pub output_dir: PathBuf,

    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://markets.businessinsider.com".to_string(),
            listing_path: "/index/components/s&p_500?p={page}".to_string(),
            rate_url: "https://www.cbr.ru/scripts/XML_daily.asp".to_string(),
            currency_id: "R01235".to_string(),
            pages: 2,
            max_in_flight: 8,
            request_timeout_secs: 30,
            max_retries: 0,
            top_n: 10,
            output_dir: PathBuf::from("."),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ScrapeConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the full config, defaults included.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pages == 0 {
            return Err(ConfigError::Invalid("pages must be at least 1".into()));
        }
        if self.max_in_flight == 0 {
            return Err(ConfigError::Invalid("max_in_flight must be at least 1".into()));
        }
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }
        if !self.listing_path.contains("{page}") {
            return Err(ConfigError::Invalid(format!(
                "listing_path '{}' has no {{page}} placeholder",
                self.listing_path
            )));
        }
        Ok(())
    }

    /// `request_timeout_secs` as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            timeout: self.request_timeout(),
            user_agent: self.user_agent.clone(),
            max_retries: self.max_retries,
            ..HttpOptions::default()
        }
    }
}
