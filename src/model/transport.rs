use crate::error::{Error, ErrorContext};
use crate::Result;
use keyring::Entry;
use serde_json::Value;
use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Resolve the model API key: OS keyring first, then the environment.
pub fn resolve_api_key() -> Result<String> {
    // 1. Try keyring
    if let Ok(entry) = Entry::new("daver", "gemini") {
        if let Ok(key) = entry.get_password() {
            return Ok(key);
        }
    }

    // 2. Try environment variable
    if let Ok(key) = env::var("GEMINI_API_KEY") {
        if !key.trim().is_empty() {
            return Ok(key);
        }
    }

    Err(Error::credential_with_context(
        "no Gemini API key found",
        ErrorContext::new()
            .with_details("store one in the keyring (service 'daver') or set GEMINI_API_KEY")
            .with_source("model_transport"),
    ))
}

pub struct ModelTransport {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl ModelTransport {
    pub fn new(model: &str) -> Result<Self> {
        Self::build(model, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(model: &str, base_url: &str) -> Result<Self> {
        Self::build(model, base_url)
    }

    fn build(model: &str, base_url: &str) -> Result<Self> {
        let api_key = resolve_api_key()?;

        // Minimal production-friendly defaults (env-overridable).
        let timeout_secs = env::var("DAVER_MODEL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// POST the request body to `models/{model}:generateContent` and return
    /// the parsed JSON response.
    pub async fn generate_content(&self, body: &Value) -> Result<Value> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(Error::credential_with_context(
                    format!("model endpoint rejected the API key (HTTP {})", status),
                    ErrorContext::new().with_source("model_transport"),
                ));
            }
            return Err(Error::Model {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
