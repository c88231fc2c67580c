//! Application configuration.
//!
//! Loaded from a YAML file, then overridden by environment variables so a
//! deployment can point the same binary at a different sheet or model without
//! editing the file. The sheet URL is the only required field.

use crate::error::{Error, ErrorContext};
use crate::Result;
use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Share link of the team spreadsheet.
    pub sheet_url: String,

    /// Tab gid holding the "last updated" timestamp cell, when the sheet
    /// maintains one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_gid: Option<u64>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Seconds a loaded table is considered fresh.
    #[serde(default = "default_ttl_secs")]
    pub refresh_ttl_secs: u64,

    /// Literal rows included in the prompt sample.
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// Require the shared access password before serving the session.
    #[serde(default)]
    pub require_password: bool,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_ttl_secs() -> u64 {
    600
}

fn default_sample_rows() -> usize {
    crate::prompt::DEFAULT_SAMPLE_ROWS
}

impl AppConfig {
    pub fn new(sheet_url: impl Into<String>) -> Self {
        Self {
            sheet_url: sheet_url.into(),
            timestamp_gid: None,
            model: default_model(),
            refresh_ttl_secs: default_ttl_secs(),
            sample_rows: default_sample_rows(),
            temperature: None,
            max_output_tokens: None,
            require_password: false,
        }
    }

    /// Load from a YAML file, then apply environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: AppConfig = serde_yaml::from_str(&content).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot parse config file: {}", e),
                ErrorContext::new()
                    .with_field_path(path.as_ref().display().to_string())
                    .with_source("config_loader"),
            )
        })?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Build entirely from the environment (`DAVER_SHEET_URL` required).
    pub fn from_env() -> Result<Self> {
        let sheet_url = env::var("DAVER_SHEET_URL").map_err(|_| {
            Error::configuration_with_context(
                "DAVER_SHEET_URL is not set and no config file was given",
                ErrorContext::new()
                    .with_field_path("config.sheet_url")
                    .with_source("config_loader"),
            )
        })?;
        let mut config = Self::new(sheet_url);
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("DAVER_SHEET_URL") {
            self.sheet_url = v;
        }
        if let Ok(v) = env::var("DAVER_MODEL") {
            self.model = v;
        }
        if let Some(v) = env_parse::<u64>("DAVER_TTL_SECS") {
            self.refresh_ttl_secs = v;
        }
        if let Some(v) = env_parse::<u64>("DAVER_TIMESTAMP_GID") {
            self.timestamp_gid = Some(v);
        }
        if let Some(v) = env_parse::<usize>("DAVER_SAMPLE_ROWS") {
            self.sample_rows = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.sheet_url).map_err(|e| {
            Error::configuration_with_context(
                format!("sheet_url is not a valid URL: {}", e),
                ErrorContext::new()
                    .with_field_path("config.sheet_url")
                    .with_source("config_loader"),
            )
        })?;
        if self.sample_rows == 0 {
            return Err(Error::configuration_with_context(
                "sample_rows must be at least 1",
                ErrorContext::new().with_field_path("config.sample_rows"),
            ));
        }
        Ok(())
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse::<T>().ok())
}

/// Shared access password, kept out of the config file: keyring first, then
/// the `DAVER_ACCESS_PASSWORD` environment variable.
pub fn access_password() -> Option<String> {
    if let Ok(entry) = Entry::new("daver", "access") {
        if let Ok(password) = entry.get_password() {
            return Some(password);
        }
    }
    env::var("DAVER_ACCESS_PASSWORD")
        .ok()
        .filter(|p| !p.trim().is_empty())
}
